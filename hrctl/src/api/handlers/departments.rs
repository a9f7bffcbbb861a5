use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            branches::ListCatalogQuery,
            departments::{DepartmentCreate, DepartmentResponse, DepartmentUpdate},
            pagination::{Paginated, Pagination},
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Departments, Employees, Repository, branches::CatalogFilter, employees::EmployeeFilter},
        models::employees::EmployeeDBResponse,
    },
    errors::{Error, Result},
};

/// List departments
#[utoipa::path(
    get,
    path = "/departments",
    tag = "departments",
    summary = "List departments",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Page of departments", body = Paginated<DepartmentResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_departments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCatalogQuery>,
    _: RequiresPermission<resource::Departments, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<DepartmentResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CatalogFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..CatalogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Departments::new(&mut conn);
    let departments = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(departments, &query.pagination, total)))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/departments",
    tag = "departments",
    summary = "Create department",
    request_body = DepartmentCreate,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Name already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_department(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Departments, operation::Create>,
    ApiJson(request): ApiJson<DepartmentCreate>,
) -> Result<ApiResponse<DepartmentResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let department = Departments::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(department).with_message("Department created successfully"))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/departments/{id}",
    tag = "departments",
    summary = "Get department",
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department", body = DepartmentResponse),
        (status = 404, description = "Department not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_department(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Departments, operation::ReadAll>,
) -> Result<ApiResponse<DepartmentResponse>> {
    let mut conn = state.db.acquire().await?;
    let department = Departments::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Department", id))?;
    Ok(ApiResponse::ok(department))
}

/// Update a department
#[utoipa::path(
    patch,
    path = "/departments/{id}",
    tag = "departments",
    summary = "Update department",
    params(("id" = i64, Path, description = "Department id")),
    request_body = DepartmentUpdate,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 404, description = "Department not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_department(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Departments, operation::Update>,
    ApiJson(request): ApiJson<DepartmentUpdate>,
) -> Result<ApiResponse<DepartmentResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let department = Departments::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Department", id))?;
    Ok(ApiResponse::ok(department).with_message("Department updated successfully"))
}

/// Deactivate a department
#[utoipa::path(
    delete,
    path = "/departments/{id}",
    tag = "departments",
    summary = "Deactivate department",
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deactivated"),
        (status = 404, description = "Department not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_department(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Departments, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Departments::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Department", id));
    }
    Ok(ApiResponse::message_only("Department deactivated successfully"))
}

/// Active employees of a department
#[utoipa::path(
    get,
    path = "/departments/{id}/employees",
    tag = "departments",
    summary = "List department employees",
    params(("id" = i64, Path, description = "Department id"), Pagination),
    responses(
        (status = 200, description = "Page of employees", body = Paginated<EmployeeDBResponse>),
        (status = 404, description = "Department not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_department_employees(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ApiQuery(pagination): ApiQuery<Pagination>,
    _: RequiresPermission<resource::Employees, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<EmployeeDBResponse>>> {
    let mut conn = state.db.acquire().await?;
    if Departments::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(Error::not_found("Department", id));
    }

    let (skip, limit) = pagination.params();
    let filter = EmployeeFilter {
        department_id: Some(id),
        ..EmployeeFilter::new(skip, limit)
    };
    let mut repo = Employees::new(&mut conn);
    let employees = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(employees, &pagination, total)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_department_crud(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrManager).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let created = server
            .post("/api/departments")
            .add_header(&name, &value)
            .json(&json!({"name": "Cardiology", "budget": "250000.00"}))
            .await;
        created.assert_status(StatusCode::CREATED);
        let id = created.json::<Value>()["data"]["department_id"].as_i64().unwrap();

        let updated = server
            .patch(&format!("/api/departments/{id}"))
            .add_header(&name, &value)
            .json(&json!({"description": "Heart care"}))
            .await;
        updated.assert_status_ok();
        let body: Value = updated.json();
        assert_eq!(body["data"]["name"], "Cardiology");
        assert_eq!(body["data"]["description"], "Heart care");

        server
            .delete(&format!("/api/departments/{id}"))
            .add_header(&name, &value)
            .await
            .assert_status_ok();

        let list: Value = server.get("/api/departments").add_header(&name, &value).await.json();
        assert_eq!(list["data"]["pagination"]["total"], 0);
        let all: Value = server
            .get("/api/departments?include_inactive=true")
            .add_header(&name, &value)
            .await
            .json();
        assert_eq!(all["data"]["pagination"]["total"], 1);
    }

    #[sqlx::test]
    async fn test_duplicate_department_name_conflicts(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        create_test_department(&pool, "Cardiology").await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let response = server
            .post("/api/departments")
            .add_header(&name, &value)
            .json(&json!({"name": "Cardiology"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_staff_cannot_delete_department(pool: PgPool) {
        let staff = create_test_user(&pool, Role::HrStaff).await;
        let department = create_test_department(&pool, "Cardiology").await;
        let server = create_test_app(pool.clone());
        let (name, value) = add_auth_headers(&staff);

        server
            .delete(&format!("/api/departments/{}", department.id))
            .add_header(&name, &value)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let active: bool = sqlx::query_scalar("SELECT is_active FROM departments WHERE id = $1")
            .bind(department.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(active);
    }

    #[sqlx::test]
    async fn test_department_employees(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let cardiology = create_test_department(&pool, "Cardiology").await;
        let surgery = create_test_department(&pool, "Surgery").await;
        create_test_employee(&pool, "heart@hospital.local", cardiology.id).await;
        create_test_employee(&pool, "knife@hospital.local", surgery.id).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let body: Value = server
            .get(&format!("/api/departments/{}/employees", cardiology.id))
            .add_header(&name, &value)
            .await
            .json();
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["email"], "heart@hospital.local");

        server
            .get("/api/departments/9999/employees")
            .add_header(&name, &value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
