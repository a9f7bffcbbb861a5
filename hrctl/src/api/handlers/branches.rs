use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            branches::{BranchCreate, BranchResponse, BranchUpdate, ListCatalogQuery},
            pagination::Paginated,
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{Branches, Repository, branches::CatalogFilter},
    errors::{Error, Result},
};

/// List branches
#[utoipa::path(
    get,
    path = "/branches",
    tag = "branches",
    summary = "List branches",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Page of branches", body = Paginated<BranchResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_branches(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCatalogQuery>,
    _: RequiresPermission<resource::Branches, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<BranchResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CatalogFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..CatalogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Branches::new(&mut conn);
    let branches = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(branches, &query.pagination, total)))
}

/// Create a branch
#[utoipa::path(
    post,
    path = "/branches",
    tag = "branches",
    summary = "Create branch",
    request_body = BranchCreate,
    responses(
        (status = 201, description = "Branch created", body = BranchResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Name already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_branch(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Branches, operation::Create>,
    ApiJson(request): ApiJson<BranchCreate>,
) -> Result<ApiResponse<BranchResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let branch = Branches::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(branch).with_message("Branch created successfully"))
}

/// Get a branch
#[utoipa::path(
    get,
    path = "/branches/{id}",
    tag = "branches",
    summary = "Get branch",
    params(("id" = i64, Path, description = "Branch id")),
    responses(
        (status = 200, description = "Branch", body = BranchResponse),
        (status = 404, description = "Branch not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_branch(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Branches, operation::ReadAll>,
) -> Result<ApiResponse<BranchResponse>> {
    let mut conn = state.db.acquire().await?;
    let branch = Branches::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Branch", id))?;
    Ok(ApiResponse::ok(branch))
}

/// Update a branch
#[utoipa::path(
    patch,
    path = "/branches/{id}",
    tag = "branches",
    summary = "Update branch",
    params(("id" = i64, Path, description = "Branch id")),
    request_body = BranchUpdate,
    responses(
        (status = 200, description = "Branch updated", body = BranchResponse),
        (status = 404, description = "Branch not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_branch(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Branches, operation::Update>,
    ApiJson(request): ApiJson<BranchUpdate>,
) -> Result<ApiResponse<BranchResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let branch = Branches::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Branch", id))?;
    Ok(ApiResponse::ok(branch).with_message("Branch updated successfully"))
}

/// Deactivate a branch
#[utoipa::path(
    delete,
    path = "/branches/{id}",
    tag = "branches",
    summary = "Deactivate branch",
    params(("id" = i64, Path, description = "Branch id")),
    responses(
        (status = 200, description = "Branch deactivated"),
        (status = 404, description = "Branch not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_branch(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Branches, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Branches::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Branch", id));
    }
    Ok(ApiResponse::message_only("Branch deactivated successfully"))
}
