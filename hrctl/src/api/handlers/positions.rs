use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            pagination::Paginated,
            positions::{ListPositionsQuery, PositionCreate, PositionResponse, PositionUpdate},
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{Positions, Repository, positions::PositionFilter},
    errors::{Error, Result},
};

/// List positions
#[utoipa::path(
    get,
    path = "/positions",
    tag = "positions",
    summary = "List positions",
    params(ListPositionsQuery),
    responses(
        (status = 200, description = "Page of positions", body = Paginated<PositionResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_positions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPositionsQuery>,
    _: RequiresPermission<resource::Positions, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<PositionResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = PositionFilter {
        skip,
        limit,
        department_id: query.department_id,
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Positions::new(&mut conn);
    let positions = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(positions, &query.pagination, total)))
}

/// Create a position
#[utoipa::path(
    post,
    path = "/positions",
    tag = "positions",
    summary = "Create position",
    request_body = PositionCreate,
    responses(
        (status = 201, description = "Position created", body = PositionResponse),
        (status = 400, description = "Validation failed"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_position(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Positions, operation::Create>,
    ApiJson(request): ApiJson<PositionCreate>,
) -> Result<ApiResponse<PositionResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let position = Positions::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(position).with_message("Position created successfully"))
}

/// Get a position
#[utoipa::path(
    get,
    path = "/positions/{id}",
    tag = "positions",
    summary = "Get position",
    params(("id" = i64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position", body = PositionResponse),
        (status = 404, description = "Position not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_position(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Positions, operation::ReadAll>,
) -> Result<ApiResponse<PositionResponse>> {
    let mut conn = state.db.acquire().await?;
    let position = Positions::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Position", id))?;
    Ok(ApiResponse::ok(position))
}

/// Update a position
#[utoipa::path(
    patch,
    path = "/positions/{id}",
    tag = "positions",
    summary = "Update position",
    params(("id" = i64, Path, description = "Position id")),
    request_body = PositionUpdate,
    responses(
        (status = 200, description = "Position updated", body = PositionResponse),
        (status = 404, description = "Position not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_position(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Positions, operation::Update>,
    ApiJson(request): ApiJson<PositionUpdate>,
) -> Result<ApiResponse<PositionResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let position = Positions::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Position", id))?;
    Ok(ApiResponse::ok(position).with_message("Position updated successfully"))
}

/// Deactivate a position
#[utoipa::path(
    delete,
    path = "/positions/{id}",
    tag = "positions",
    summary = "Deactivate position",
    params(("id" = i64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position deactivated"),
        (status = 404, description = "Position not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_position(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Positions, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Positions::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Position", id));
    }
    Ok(ApiResponse::message_only("Position deactivated successfully"))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_user};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_positions_filter_by_department(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let icu = create_test_department(&pool, "ICU").await;
        let lab = create_test_department(&pool, "Laboratory").await;
        let server = create_test_app(pool);
        let (name, value) = add_auth_headers(&hr);

        for (title, department) in [("Charge Nurse", icu.id), ("Intensivist", icu.id), ("Phlebotomist", lab.id)] {
            server
                .post("/api/positions")
                .add_header(&name, &value)
                .json(&json!({"title": title, "department_id": department}))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let body: Value = server
            .get(&format!("/api/positions?department_id={}", icu.id))
            .add_header(&name, &value)
            .await
            .json();
        assert_eq!(body["data"]["pagination"]["total"], 2);

        let body: Value = server
            .get("/api/positions?search=phleb")
            .add_header(&name, &value)
            .await
            .json();
        assert_eq!(body["data"]["items"][0]["title"], "Phlebotomist");
    }
}
