use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            employees::{EmployeeCreate, EmployeeUpdate, ListEmployeesQuery},
            pagination::{Paginated, Pagination},
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, operation, require_read, resource},
    db::{
        handlers::{
            BenefitAssignments, Employees, Payslips, Repository, employees::EmployeeFilter, payroll::PayslipFilter,
        },
        models::{benefits::EmployeeBenefitDBResponse, employees::EmployeeDBResponse, payroll::PayslipDBResponse},
    },
    errors::{Error, Result},
    types::Resource,
};

/// List employees
#[utoipa::path(
    get,
    path = "/employees",
    tag = "employees",
    summary = "List employees",
    params(ListEmployeesQuery),
    responses(
        (status = 200, description = "Page of employees", body = Paginated<EmployeeDBResponse>),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_employees(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEmployeesQuery>,
    _: RequiresPermission<resource::Employees, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<EmployeeDBResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = EmployeeFilter {
        department_id: query.department_id,
        branch_id: query.branch_id,
        position_id: query.position_id,
        employment_type: query.employment_type,
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..EmployeeFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Employees::new(&mut conn);
    let employees = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(ApiResponse::ok(Paginated::new(employees, &query.pagination, total)))
}

/// Create an employee
#[utoipa::path(
    post,
    path = "/employees",
    tag = "employees",
    summary = "Create employee",
    request_body = EmployeeCreate,
    responses(
        (status = 201, description = "Employee created", body = EmployeeDBResponse),
        (status = 400, description = "Validation failed or unknown department"),
        (status = 409, description = "Email or employee number already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_employee(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Employees, operation::Create>,
    ApiJson(request): ApiJson<EmployeeCreate>,
) -> Result<ApiResponse<EmployeeDBResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let employee = Employees::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(employee).with_message("Employee created successfully"))
}

/// Get an employee. Employees may read their own record.
#[utoipa::path(
    get,
    path = "/employees/{id}",
    tag = "employees",
    summary = "Get employee",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = EmployeeDBResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_employee(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<EmployeeDBResponse>> {
    require_read(&current_user, Resource::Employees, id)?;

    let mut conn = state.db.acquire().await?;
    let employee = Employees::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Employee", id))?;
    Ok(ApiResponse::ok(employee))
}

/// Update an employee. `PUT` is accepted as an alias.
#[utoipa::path(
    patch,
    path = "/employees/{id}",
    tag = "employees",
    summary = "Update employee",
    params(("id" = i64, Path, description = "Employee id")),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeDBResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_employee(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Employees, operation::Update>,
    ApiJson(request): ApiJson<EmployeeUpdate>,
) -> Result<ApiResponse<EmployeeDBResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let employee = Employees::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Employee", id))?;
    Ok(ApiResponse::ok(employee).with_message("Employee updated successfully"))
}

/// Deactivate an employee
#[utoipa::path(
    delete,
    path = "/employees/{id}",
    tag = "employees",
    summary = "Deactivate employee",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deactivated"),
        (status = 404, description = "Employee not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_employee(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Employees, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Employees::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Employee", id));
    }
    Ok(ApiResponse::message_only("Employee deactivated successfully"))
}

/// Benefits currently assigned to an employee
#[utoipa::path(
    get,
    path = "/employees/{id}/benefits",
    tag = "employees",
    summary = "List employee benefits",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Active benefit assignments", body = Vec<EmployeeBenefitDBResponse>),
        (status = 404, description = "Employee not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_employee_benefits(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<Vec<EmployeeBenefitDBResponse>>> {
    require_read(&current_user, Resource::Employees, id)?;

    let mut conn = state.db.acquire().await?;
    if !Employees::new(&mut conn).exists(id).await? {
        return Err(Error::not_found("Employee", id));
    }
    let benefits = BenefitAssignments::new(&mut conn).list_for_employee(id, false).await?;
    Ok(ApiResponse::ok(benefits))
}

/// Payslips of an employee, newest first
#[utoipa::path(
    get,
    path = "/employees/{id}/payslips",
    tag = "employees",
    summary = "List employee payslips",
    params(("id" = i64, Path, description = "Employee id"), Pagination),
    responses(
        (status = 200, description = "Page of payslips", body = Paginated<PayslipDBResponse>),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_employee_payslips(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ApiQuery(pagination): ApiQuery<Pagination>,
    current_user: CurrentUser,
) -> Result<ApiResponse<Paginated<PayslipDBResponse>>> {
    require_read(&current_user, Resource::Payroll, id)?;

    let (skip, limit) = pagination.params();
    let filter = PayslipFilter {
        skip,
        limit,
        employee_id: Some(id),
        ..Default::default()
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Payslips::new(&mut conn);
    let payslips = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(payslips, &pagination, total)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{
        add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user,
        create_test_user_for_employee,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_missing_fields_are_reported_and_nothing_is_stored(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let server = create_test_app(pool.clone());
        let (name, value) = add_auth_headers(&hr);

        let response = server
            .post("/api/employees")
            .add_header(&name, &value)
            .json(&json!({"first_name": "Ana", "email": "not-an-email"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["last_name"], "last_name is required");
        assert_eq!(body["error"]["job_title"], "job_title is required");
        assert_eq!(body["error"]["department_id"], "department_id is required");
        assert_eq!(body["error"]["email"], "email must be a valid email address");
        assert!(body["error"].get("first_name").is_none());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn test_unknown_department_is_bad_request(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let response = server
            .post("/api/employees")
            .add_header(&name, &value)
            .json(&json!({
                "first_name": "Ana",
                "last_name": "Reyes",
                "email": "ana@hospital.local",
                "job_title": "Nurse",
                "department_id": 999
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_put_is_an_alias_for_patch(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Pediatrics").await;
        let employee = create_test_employee(&pool, "kid-doc@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let response = server
            .put(&format!("/api/employees/{}", employee.id))
            .add_header(&name, &value)
            .json(&json!({"job_title": "Senior Pediatrician"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["job_title"], "Senior Pediatrician");
        assert_eq!(body["data"]["email"], "kid-doc@hospital.local");
    }

    #[sqlx::test]
    async fn test_employee_reads_only_own_record(pool: PgPool) {
        let department = create_test_department(&pool, "Pediatrics").await;
        let me = create_test_employee(&pool, "me@hospital.local", department.id).await;
        let colleague = create_test_employee(&pool, "colleague@hospital.local", department.id).await;
        let user = create_test_user_for_employee(&pool, Role::Employee, me.id).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&user);

        server
            .get(&format!("/api/employees/{}", me.id))
            .add_header(&name, &value)
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/employees/{}", colleague.id))
            .add_header(&name, &value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/employees")
            .add_header(&name, &value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_invalid_id_and_missing_employee(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrManager).await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let response = server.get("/api/employees/abc").add_header(&name, &value).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server.get("/api/employees/4242").add_header(&name, &value).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "not_found");
    }

    #[sqlx::test]
    async fn test_pagination_metadata(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let department = create_test_department(&pool, "Records").await;
        for i in 0..5 {
            create_test_employee(&pool, &format!("clerk{i}@hospital.local"), department.id).await;
        }
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        let body: Value = server
            .get("/api/employees?page=2&limit=2")
            .add_header(&name, &value)
            .await
            .json();
        let page = &body["data"]["pagination"];
        assert_eq!(page["total"], 5);
        assert_eq!(page["total_pages"], 3);
        assert_eq!(page["has_next"], true);
        assert_eq!(page["has_prev"], true);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

        let last: Value = server
            .get("/api/employees?page=3&limit=2")
            .add_header(&name, &value)
            .await
            .json();
        assert_eq!(last["data"]["pagination"]["has_next"], false);
        assert_eq!(last["data"]["items"].as_array().unwrap().len(), 1);
    }
}
