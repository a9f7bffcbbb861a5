//! Benefit catalog and assignment of benefits to employees.

use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            benefits::{
                BenefitAssignmentCreate, BenefitAssignmentResponse, BenefitCategoryCreate, BenefitCategoryResponse,
                BenefitCategoryUpdate, BenefitCreate, BenefitResponse, BenefitUpdate, ListBenefitsQuery,
            },
            branches::ListCatalogQuery,
            pagination::Paginated,
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{
        BenefitAssignments, BenefitCategories, Benefits, Repository, benefits::BenefitFilter, branches::CatalogFilter,
    },
    errors::{Error, Result},
};

/// List benefit categories
#[utoipa::path(
    get,
    path = "/benefits/categories",
    tag = "benefits",
    summary = "List benefit categories",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Page of categories", body = Paginated<BenefitCategoryResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCatalogQuery>,
    _: RequiresPermission<resource::Benefits, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<BenefitCategoryResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CatalogFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..CatalogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = BenefitCategories::new(&mut conn);
    let categories = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(categories, &query.pagination, total)))
}

/// Create a benefit category
#[utoipa::path(
    post,
    path = "/benefits/categories",
    tag = "benefits",
    summary = "Create benefit category",
    request_body = BenefitCategoryCreate,
    responses(
        (status = 201, description = "Category created", body = BenefitCategoryResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Name already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Benefits, operation::Create>,
    ApiJson(request): ApiJson<BenefitCategoryCreate>,
) -> Result<ApiResponse<BenefitCategoryResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let category = BenefitCategories::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(category).with_message("Benefit category created successfully"))
}

/// Get a benefit category
#[utoipa::path(
    get,
    path = "/benefits/categories/{id}",
    tag = "benefits",
    summary = "Get benefit category",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = BenefitCategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::ReadAll>,
) -> Result<ApiResponse<BenefitCategoryResponse>> {
    let mut conn = state.db.acquire().await?;
    let category = BenefitCategories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Benefit category", id))?;
    Ok(ApiResponse::ok(category))
}

/// Update a benefit category
#[utoipa::path(
    patch,
    path = "/benefits/categories/{id}",
    tag = "benefits",
    summary = "Update benefit category",
    params(("id" = i64, Path, description = "Category id")),
    request_body = BenefitCategoryUpdate,
    responses(
        (status = 200, description = "Category updated", body = BenefitCategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Update>,
    ApiJson(request): ApiJson<BenefitCategoryUpdate>,
) -> Result<ApiResponse<BenefitCategoryResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let category = BenefitCategories::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Benefit category", id))?;
    Ok(ApiResponse::ok(category).with_message("Benefit category updated successfully"))
}

/// Deactivate a benefit category
#[utoipa::path(
    delete,
    path = "/benefits/categories/{id}",
    tag = "benefits",
    summary = "Deactivate benefit category",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deactivated"),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !BenefitCategories::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Benefit category", id));
    }
    Ok(ApiResponse::message_only("Benefit category deactivated successfully"))
}

/// List benefits
#[utoipa::path(
    get,
    path = "/benefits",
    tag = "benefits",
    summary = "List benefits",
    params(ListBenefitsQuery),
    responses(
        (status = 200, description = "Page of benefits", body = Paginated<BenefitResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_benefits(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBenefitsQuery>,
    _: RequiresPermission<resource::Benefits, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<BenefitResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = BenefitFilter {
        skip,
        limit,
        category_id: query.category_id,
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Benefits::new(&mut conn);
    let benefits = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(benefits, &query.pagination, total)))
}

/// Create a benefit
#[utoipa::path(
    post,
    path = "/benefits",
    tag = "benefits",
    summary = "Create benefit",
    request_body = BenefitCreate,
    responses(
        (status = 201, description = "Benefit created", body = BenefitResponse),
        (status = 400, description = "Validation failed or unknown category"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_benefit(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Benefits, operation::Create>,
    ApiJson(request): ApiJson<BenefitCreate>,
) -> Result<ApiResponse<BenefitResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let benefit = Benefits::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(benefit).with_message("Benefit created successfully"))
}

/// Get a benefit
#[utoipa::path(
    get,
    path = "/benefits/{id}",
    tag = "benefits",
    summary = "Get benefit",
    params(("id" = i64, Path, description = "Benefit id")),
    responses(
        (status = 200, description = "Benefit", body = BenefitResponse),
        (status = 404, description = "Benefit not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_benefit(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::ReadAll>,
) -> Result<ApiResponse<BenefitResponse>> {
    let mut conn = state.db.acquire().await?;
    let benefit = Benefits::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Benefit", id))?;
    Ok(ApiResponse::ok(benefit))
}

/// Update a benefit
#[utoipa::path(
    patch,
    path = "/benefits/{id}",
    tag = "benefits",
    summary = "Update benefit",
    params(("id" = i64, Path, description = "Benefit id")),
    request_body = BenefitUpdate,
    responses(
        (status = 200, description = "Benefit updated", body = BenefitResponse),
        (status = 404, description = "Benefit not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_benefit(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Update>,
    ApiJson(request): ApiJson<BenefitUpdate>,
) -> Result<ApiResponse<BenefitResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let benefit = Benefits::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Benefit", id))?;
    Ok(ApiResponse::ok(benefit).with_message("Benefit updated successfully"))
}

/// Deactivate a benefit
#[utoipa::path(
    delete,
    path = "/benefits/{id}",
    tag = "benefits",
    summary = "Deactivate benefit",
    params(("id" = i64, Path, description = "Benefit id")),
    responses(
        (status = 200, description = "Benefit deactivated"),
        (status = 404, description = "Benefit not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_benefit(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Benefits::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Benefit", id));
    }
    Ok(ApiResponse::message_only("Benefit deactivated successfully"))
}

/// Assign a benefit to an employee
#[utoipa::path(
    post,
    path = "/benefits/{id}/assignments",
    tag = "benefits",
    summary = "Assign benefit",
    params(("id" = i64, Path, description = "Benefit id")),
    request_body = BenefitAssignmentCreate,
    responses(
        (status = 201, description = "Benefit assigned", body = BenefitAssignmentResponse),
        (status = 400, description = "Validation failed, unknown employee or inactive benefit"),
        (status = 404, description = "Benefit not found"),
        (status = 409, description = "Employee already holds this benefit"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn assign_benefit(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Create>,
    ApiJson(request): ApiJson<BenefitAssignmentCreate>,
) -> Result<ApiResponse<BenefitAssignmentResponse>> {
    let request = request.validate(id)?;

    let mut conn = state.db.acquire().await?;
    let benefit = Benefits::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Benefit", id))?;
    if !benefit.is_active {
        return Err(Error::BadRequest {
            message: format!("Benefit {} is no longer offered", benefit.name),
        });
    }

    let assignment = BenefitAssignments::new(&mut conn).assign(&request).await?;
    Ok(ApiResponse::created(assignment).with_message("Benefit assigned successfully"))
}

/// End a benefit assignment
#[utoipa::path(
    delete,
    path = "/benefits/assignments/{id}",
    tag = "benefits",
    summary = "End benefit assignment",
    params(("id" = i64, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment ended", body = BenefitAssignmentResponse),
        (status = 404, description = "No active assignment with this id"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn end_assignment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Benefits, operation::Update>,
) -> Result<ApiResponse<BenefitAssignmentResponse>> {
    let mut conn = state.db.acquire().await?;
    let assignment = BenefitAssignments::new(&mut conn)
        .end(id)
        .await
        .map_err(|e| Error::from_lookup(e, "Benefit assignment", id))?;
    Ok(ApiResponse::ok(assignment).with_message("Benefit assignment ended"))
}
