//! Salaries, bonuses and deductions.
//!
//! Salary writes run in a transaction: making a salary current demotes the employee's
//! previous current salary, and both statements must land together.

use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId},
        models::{
            pagination::Paginated,
            response::ApiResponse,
            salaries::{
                BonusCreate, BonusResponse, BonusUpdate, DeductionCreate, DeductionResponse, DeductionUpdate,
                ListBonusesQuery, ListDeductionsQuery, ListSalariesQuery, SalaryCreate, SalaryResponse, SalaryUpdate,
            },
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{
        Bonuses, Deductions, Repository, Salaries, bonuses::BonusFilter, deductions::DeductionFilter,
        salaries::SalaryFilter,
    },
    errors::{Error, Result},
};

/// List salaries
#[utoipa::path(
    get,
    path = "/salaries",
    tag = "salaries",
    summary = "List salaries",
    params(ListSalariesQuery),
    responses(
        (status = 200, description = "Page of salaries", body = Paginated<SalaryResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_salaries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListSalariesQuery>,
    _: RequiresPermission<resource::Salaries, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<SalaryResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = SalaryFilter {
        skip,
        limit,
        employee_id: query.employee_id,
        current_only: query.current_only.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Salaries::new(&mut conn);
    let salaries = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(salaries, &query.pagination, total)))
}

/// Record a salary
#[utoipa::path(
    post,
    path = "/salaries",
    tag = "salaries",
    summary = "Create salary",
    request_body = SalaryCreate,
    responses(
        (status = 201, description = "Salary created", body = SalaryResponse),
        (status = 400, description = "Validation failed or unknown employee"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_salary(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Salaries, operation::Create>,
    ApiJson(request): ApiJson<SalaryCreate>,
) -> Result<ApiResponse<SalaryResponse>> {
    let request = request.validate()?;
    let mut tx = state.db.begin().await?;
    let salary = Salaries::new(&mut tx).create(&request).await?;
    tx.commit().await?;
    Ok(ApiResponse::created(salary).with_message("Salary created successfully"))
}

/// Get a salary
#[utoipa::path(
    get,
    path = "/salaries/{id}",
    tag = "salaries",
    summary = "Get salary",
    params(("id" = i64, Path, description = "Salary id")),
    responses(
        (status = 200, description = "Salary", body = SalaryResponse),
        (status = 404, description = "Salary not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_salary(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Salaries, operation::ReadAll>,
) -> Result<ApiResponse<SalaryResponse>> {
    let mut conn = state.db.acquire().await?;
    let salary = Salaries::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Salary", id))?;
    Ok(ApiResponse::ok(salary))
}

/// Update a salary
#[utoipa::path(
    patch,
    path = "/salaries/{id}",
    tag = "salaries",
    summary = "Update salary",
    params(("id" = i64, Path, description = "Salary id")),
    request_body = SalaryUpdate,
    responses(
        (status = 200, description = "Salary updated", body = SalaryResponse),
        (status = 404, description = "Salary not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_salary(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Salaries, operation::Update>,
    ApiJson(request): ApiJson<SalaryUpdate>,
) -> Result<ApiResponse<SalaryResponse>> {
    let request = request.validate()?;
    let mut tx = state.db.begin().await?;
    let salary = Salaries::new(&mut tx)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Salary", id))?;
    tx.commit().await?;
    Ok(ApiResponse::ok(salary).with_message("Salary updated successfully"))
}

/// Retire a salary
///
/// The row stays on record for history; it simply stops being current.
#[utoipa::path(
    delete,
    path = "/salaries/{id}",
    tag = "salaries",
    summary = "Retire salary",
    params(("id" = i64, Path, description = "Salary id")),
    responses(
        (status = 200, description = "Salary retired"),
        (status = 404, description = "Salary not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_salary(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Salaries, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Salaries::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Salary", id));
    }
    Ok(ApiResponse::message_only("Salary retired successfully"))
}

/// List bonuses
#[utoipa::path(
    get,
    path = "/bonuses",
    tag = "bonuses",
    summary = "List bonuses",
    params(ListBonusesQuery),
    responses(
        (status = 200, description = "Page of bonuses", body = Paginated<BonusResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bonuses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBonusesQuery>,
    _: RequiresPermission<resource::Bonuses, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<BonusResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = BonusFilter {
        skip,
        limit,
        employee_id: query.employee_id,
        from: query.from,
        to: query.to,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Bonuses::new(&mut conn);
    let bonuses = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(bonuses, &query.pagination, total)))
}

/// Award a bonus
#[utoipa::path(
    post,
    path = "/bonuses",
    tag = "bonuses",
    summary = "Create bonus",
    request_body = BonusCreate,
    responses(
        (status = 201, description = "Bonus created", body = BonusResponse),
        (status = 400, description = "Validation failed or unknown employee"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_bonus(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Bonuses, operation::Create>,
    ApiJson(request): ApiJson<BonusCreate>,
) -> Result<ApiResponse<BonusResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let bonus = Bonuses::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(bonus).with_message("Bonus created successfully"))
}

/// Get a bonus
#[utoipa::path(
    get,
    path = "/bonuses/{id}",
    tag = "bonuses",
    summary = "Get bonus",
    params(("id" = i64, Path, description = "Bonus id")),
    responses(
        (status = 200, description = "Bonus", body = BonusResponse),
        (status = 404, description = "Bonus not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_bonus(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Bonuses, operation::ReadAll>,
) -> Result<ApiResponse<BonusResponse>> {
    let mut conn = state.db.acquire().await?;
    let bonus = Bonuses::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Bonus", id))?;
    Ok(ApiResponse::ok(bonus))
}

/// Update a bonus
#[utoipa::path(
    patch,
    path = "/bonuses/{id}",
    tag = "bonuses",
    summary = "Update bonus",
    params(("id" = i64, Path, description = "Bonus id")),
    request_body = BonusUpdate,
    responses(
        (status = 200, description = "Bonus updated", body = BonusResponse),
        (status = 404, description = "Bonus not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_bonus(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Bonuses, operation::Update>,
    ApiJson(request): ApiJson<BonusUpdate>,
) -> Result<ApiResponse<BonusResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let bonus = Bonuses::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Bonus", id))?;
    Ok(ApiResponse::ok(bonus).with_message("Bonus updated successfully"))
}

/// Deactivate a bonus
#[utoipa::path(
    delete,
    path = "/bonuses/{id}",
    tag = "bonuses",
    summary = "Deactivate bonus",
    params(("id" = i64, Path, description = "Bonus id")),
    responses(
        (status = 200, description = "Bonus deactivated"),
        (status = 404, description = "Bonus not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_bonus(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Bonuses, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Bonuses::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Bonus", id));
    }
    Ok(ApiResponse::message_only("Bonus deactivated successfully"))
}

/// List deductions
#[utoipa::path(
    get,
    path = "/deductions",
    tag = "deductions",
    summary = "List deductions",
    params(ListDeductionsQuery),
    responses(
        (status = 200, description = "Page of deductions", body = Paginated<DeductionResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_deductions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListDeductionsQuery>,
    _: RequiresPermission<resource::Deductions, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<DeductionResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = DeductionFilter {
        skip,
        limit,
        employee_id: query.employee_id,
        deduction_type: query.deduction_type,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Deductions::new(&mut conn);
    let deductions = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(deductions, &query.pagination, total)))
}

/// Create a deduction
#[utoipa::path(
    post,
    path = "/deductions",
    tag = "deductions",
    summary = "Create deduction",
    request_body = DeductionCreate,
    responses(
        (status = 201, description = "Deduction created", body = DeductionResponse),
        (status = 400, description = "Validation failed or unknown employee"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_deduction(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Deductions, operation::Create>,
    ApiJson(request): ApiJson<DeductionCreate>,
) -> Result<ApiResponse<DeductionResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let deduction = Deductions::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(deduction).with_message("Deduction created successfully"))
}

/// Get a deduction
#[utoipa::path(
    get,
    path = "/deductions/{id}",
    tag = "deductions",
    summary = "Get deduction",
    params(("id" = i64, Path, description = "Deduction id")),
    responses(
        (status = 200, description = "Deduction", body = DeductionResponse),
        (status = 404, description = "Deduction not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_deduction(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Deductions, operation::ReadAll>,
) -> Result<ApiResponse<DeductionResponse>> {
    let mut conn = state.db.acquire().await?;
    let deduction = Deductions::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Deduction", id))?;
    Ok(ApiResponse::ok(deduction))
}

/// Update a deduction
#[utoipa::path(
    patch,
    path = "/deductions/{id}",
    tag = "deductions",
    summary = "Update deduction",
    params(("id" = i64, Path, description = "Deduction id")),
    request_body = DeductionUpdate,
    responses(
        (status = 200, description = "Deduction updated", body = DeductionResponse),
        (status = 404, description = "Deduction not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_deduction(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Deductions, operation::Update>,
    ApiJson(request): ApiJson<DeductionUpdate>,
) -> Result<ApiResponse<DeductionResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let deduction = Deductions::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Deduction", id))?;
    Ok(ApiResponse::ok(deduction).with_message("Deduction updated successfully"))
}

/// Deactivate a deduction
#[utoipa::path(
    delete,
    path = "/deductions/{id}",
    tag = "deductions",
    summary = "Deactivate deduction",
    params(("id" = i64, Path, description = "Deduction id")),
    responses(
        (status = 200, description = "Deduction deactivated"),
        (status = 404, description = "Deduction not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_deduction(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Deductions, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Deductions::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Deduction", id));
    }
    Ok(ApiResponse::message_only("Deduction deactivated successfully"))
}
