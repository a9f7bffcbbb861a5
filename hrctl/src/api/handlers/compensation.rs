//! Compensation planning: salary grades, pay bands, employee grade mappings, and the two
//! approval workflows (pay adjustments and grade revisions).
//!
//! Approving a workflow request applies it in the same transaction as the status change:
//! a pay adjustment becomes the employee's new current salary, a grade revision becomes the
//! grade's only active pay band.

use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId, OptionalJson},
        models::{
            branches::ListCatalogQuery,
            compensation::{
                GradeMappingCreate, GradeMappingResponse, GradeRevisionCreate, GradeRevisionResponse,
                ListApprovalsQuery, ListGradeMappingsQuery, ListPayBandsQuery, PayAdjustmentCreate,
                PayAdjustmentResponse, PayBandCreate, PayBandResponse, PayBandUpdate, SalaryGradeCreate,
                SalaryGradeResponse, SalaryGradeUpdate,
            },
            pagination::Paginated,
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{
            GradeMappings, GradeRevisions, PayAdjustments, PayBands, Repository, Salaries, SalaryGrades,
            branches::CatalogFilter,
            compensation::{ApprovalFilter, GradeMappingFilter, PayBandFilter},
        },
        models::salaries::SalaryCreateDBRequest,
    },
    errors::{Error, Result},
    lifecycle::{ApprovalAction, Lifecycle, TransitionNote},
};

fn decided_concurrently(resource: &str, id: i64) -> Error {
    Error::Conflict {
        message: format!("{resource} {id} was decided by another request"),
    }
}

// Salary grades

/// List salary grades
#[utoipa::path(
    get,
    path = "/compensation_planning/salary_grades",
    tag = "compensation planning",
    summary = "List salary grades",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Page of salary grades", body = Paginated<SalaryGradeResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_grades(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCatalogQuery>,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<SalaryGradeResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CatalogFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..CatalogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = SalaryGrades::new(&mut conn);
    let grades = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(grades, &query.pagination, total)))
}

/// Create a salary grade
#[utoipa::path(
    post,
    path = "/compensation_planning/salary_grades",
    tag = "compensation planning",
    summary = "Create salary grade",
    request_body = SalaryGradeCreate,
    responses(
        (status = 201, description = "Salary grade created", body = SalaryGradeResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Code already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_grade(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Compensation, operation::Create>,
    ApiJson(request): ApiJson<SalaryGradeCreate>,
) -> Result<ApiResponse<SalaryGradeResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let grade = SalaryGrades::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(grade).with_message("Salary grade created successfully"))
}

/// Get a salary grade
#[utoipa::path(
    get,
    path = "/compensation_planning/salary_grades/{id}",
    tag = "compensation planning",
    summary = "Get salary grade",
    params(("id" = i64, Path, description = "Salary grade id")),
    responses(
        (status = 200, description = "Salary grade", body = SalaryGradeResponse),
        (status = 404, description = "Salary grade not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_grade(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<SalaryGradeResponse>> {
    let mut conn = state.db.acquire().await?;
    let grade = SalaryGrades::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Salary grade", id))?;
    Ok(ApiResponse::ok(grade))
}

/// Update a salary grade
#[utoipa::path(
    patch,
    path = "/compensation_planning/salary_grades/{id}",
    tag = "compensation planning",
    summary = "Update salary grade",
    params(("id" = i64, Path, description = "Salary grade id")),
    request_body = SalaryGradeUpdate,
    responses(
        (status = 200, description = "Salary grade updated", body = SalaryGradeResponse),
        (status = 404, description = "Salary grade not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_grade(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::Update>,
    ApiJson(request): ApiJson<SalaryGradeUpdate>,
) -> Result<ApiResponse<SalaryGradeResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let grade = SalaryGrades::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Salary grade", id))?;
    Ok(ApiResponse::ok(grade).with_message("Salary grade updated successfully"))
}

/// Deactivate a salary grade
#[utoipa::path(
    delete,
    path = "/compensation_planning/salary_grades/{id}",
    tag = "compensation planning",
    summary = "Deactivate salary grade",
    params(("id" = i64, Path, description = "Salary grade id")),
    responses(
        (status = 200, description = "Salary grade deactivated"),
        (status = 404, description = "Salary grade not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_grade(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !SalaryGrades::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Salary grade", id));
    }
    Ok(ApiResponse::message_only("Salary grade deactivated successfully"))
}

// Pay bands

/// List pay bands
#[utoipa::path(
    get,
    path = "/compensation_planning/pay_bands",
    tag = "compensation planning",
    summary = "List pay bands",
    params(ListPayBandsQuery),
    responses(
        (status = 200, description = "Page of pay bands", body = Paginated<PayBandResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_pay_bands(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPayBandsQuery>,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<PayBandResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = PayBandFilter {
        skip,
        limit,
        grade_id: query.grade_id,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = PayBands::new(&mut conn);
    let bands = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(bands, &query.pagination, total)))
}

/// Create a pay band
#[utoipa::path(
    post,
    path = "/compensation_planning/pay_bands",
    tag = "compensation planning",
    summary = "Create pay band",
    request_body = PayBandCreate,
    responses(
        (status = 201, description = "Pay band created", body = PayBandResponse),
        (status = 400, description = "Validation failed or unknown grade"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_pay_band(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Compensation, operation::Create>,
    ApiJson(request): ApiJson<PayBandCreate>,
) -> Result<ApiResponse<PayBandResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let band = PayBands::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(band).with_message("Pay band created successfully"))
}

/// Get a pay band
#[utoipa::path(
    get,
    path = "/compensation_planning/pay_bands/{id}",
    tag = "compensation planning",
    summary = "Get pay band",
    params(("id" = i64, Path, description = "Pay band id")),
    responses(
        (status = 200, description = "Pay band", body = PayBandResponse),
        (status = 404, description = "Pay band not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_pay_band(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<PayBandResponse>> {
    let mut conn = state.db.acquire().await?;
    let band = PayBands::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Pay band", id))?;
    Ok(ApiResponse::ok(band))
}

/// Update a pay band
#[utoipa::path(
    patch,
    path = "/compensation_planning/pay_bands/{id}",
    tag = "compensation planning",
    summary = "Update pay band",
    params(("id" = i64, Path, description = "Pay band id")),
    request_body = PayBandUpdate,
    responses(
        (status = 200, description = "Pay band updated", body = PayBandResponse),
        (status = 400, description = "Figures out of order"),
        (status = 404, description = "Pay band not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_pay_band(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::Update>,
    ApiJson(request): ApiJson<PayBandUpdate>,
) -> Result<ApiResponse<PayBandResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = PayBands::new(&mut conn);
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Pay band", id))?;
    let request = request.validate(&existing)?;
    let band = repo
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "Pay band", id))?;
    Ok(ApiResponse::ok(band).with_message("Pay band updated successfully"))
}

/// Deactivate a pay band
#[utoipa::path(
    delete,
    path = "/compensation_planning/pay_bands/{id}",
    tag = "compensation planning",
    summary = "Deactivate pay band",
    params(("id" = i64, Path, description = "Pay band id")),
    responses(
        (status = 200, description = "Pay band deactivated"),
        (status = 404, description = "Pay band not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_pay_band(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !PayBands::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Pay band", id));
    }
    Ok(ApiResponse::message_only("Pay band deactivated successfully"))
}

// Grade mappings

/// List employee grade mappings
#[utoipa::path(
    get,
    path = "/compensation_planning/grade_mappings",
    tag = "compensation planning",
    summary = "List grade mappings",
    params(ListGradeMappingsQuery),
    responses(
        (status = 200, description = "Page of grade mappings", body = Paginated<GradeMappingResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_grade_mappings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListGradeMappingsQuery>,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<GradeMappingResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = GradeMappingFilter {
        skip,
        limit,
        employee_id: query.employee_id,
        grade_id: query.grade_id,
        current_only: query.current_only.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = GradeMappings::new(&mut conn);
    let mappings = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(mappings, &query.pagination, total)))
}

/// Place an employee on a grade
#[utoipa::path(
    post,
    path = "/compensation_planning/grade_mappings",
    tag = "compensation planning",
    summary = "Create grade mapping",
    request_body = GradeMappingCreate,
    responses(
        (status = 201, description = "Grade mapping created", body = GradeMappingResponse),
        (status = 400, description = "Validation failed, unknown employee or grade"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_grade_mapping(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Compensation, operation::Create>,
    ApiJson(request): ApiJson<GradeMappingCreate>,
) -> Result<ApiResponse<GradeMappingResponse>> {
    let request = request.validate()?;
    let mut tx = state.db.begin().await?;
    let mapping = GradeMappings::new(&mut tx).create(&request).await?;
    tx.commit().await?;
    Ok(ApiResponse::created(mapping).with_message("Grade mapping created successfully"))
}

/// Get a grade mapping
#[utoipa::path(
    get,
    path = "/compensation_planning/grade_mappings/{id}",
    tag = "compensation planning",
    summary = "Get grade mapping",
    params(("id" = i64, Path, description = "Grade mapping id")),
    responses(
        (status = 200, description = "Grade mapping", body = GradeMappingResponse),
        (status = 404, description = "Grade mapping not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_grade_mapping(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::ReadAll>,
) -> Result<ApiResponse<GradeMappingResponse>> {
    let mut conn = state.db.acquire().await?;
    let mapping = GradeMappings::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Grade mapping", id))?;
    Ok(ApiResponse::ok(mapping))
}

/// Delete a grade mapping permanently
#[utoipa::path(
    delete,
    path = "/compensation_planning/grade_mappings/{id}",
    tag = "compensation planning",
    summary = "Delete grade mapping",
    params(("id" = i64, Path, description = "Grade mapping id")),
    responses(
        (status = 200, description = "Grade mapping deleted"),
        (status = 404, description = "Grade mapping not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_grade_mapping(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Compensation, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !GradeMappings::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Grade mapping", id));
    }
    Ok(ApiResponse::message_only("Grade mapping deleted successfully"))
}

// Pay adjustments

/// List pay adjustment requests
#[utoipa::path(
    get,
    path = "/compensation_planning/pay_adjustments",
    tag = "compensation planning",
    summary = "List pay adjustments",
    params(ListApprovalsQuery),
    responses(
        (status = 200, description = "Page of pay adjustments", body = Paginated<PayAdjustmentResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_pay_adjustments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListApprovalsQuery>,
    _: RequiresPermission<resource::PayAdjustments, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<PayAdjustmentResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ApprovalFilter {
        skip,
        limit,
        employee_id: query.employee_id,
        grade_id: None,
        status: query.status,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = PayAdjustments::new(&mut conn);
    let adjustments = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(adjustments, &query.pagination, total)))
}

/// Request a pay adjustment
#[utoipa::path(
    post,
    path = "/compensation_planning/pay_adjustments",
    tag = "compensation planning",
    summary = "Create pay adjustment",
    request_body = PayAdjustmentCreate,
    responses(
        (status = 201, description = "Pay adjustment requested", body = PayAdjustmentResponse),
        (status = 400, description = "Validation failed or unknown employee"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_pay_adjustment(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::PayAdjustments, operation::Create>,
    ApiJson(request): ApiJson<PayAdjustmentCreate>,
) -> Result<ApiResponse<PayAdjustmentResponse>> {
    let request = request.validate(permission.id)?;
    let mut conn = state.db.acquire().await?;
    let adjustment = PayAdjustments::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(adjustment).with_message("Pay adjustment requested successfully"))
}

/// Get a pay adjustment request
#[utoipa::path(
    get,
    path = "/compensation_planning/pay_adjustments/{id}",
    tag = "compensation planning",
    summary = "Get pay adjustment",
    params(("id" = i64, Path, description = "Pay adjustment id")),
    responses(
        (status = 200, description = "Pay adjustment", body = PayAdjustmentResponse),
        (status = 404, description = "Pay adjustment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_pay_adjustment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::PayAdjustments, operation::ReadAll>,
) -> Result<ApiResponse<PayAdjustmentResponse>> {
    let mut conn = state.db.acquire().await?;
    let adjustment = PayAdjustments::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Pay adjustment", id))?;
    Ok(ApiResponse::ok(adjustment))
}

/// Approve a pay adjustment, making the proposed salary current
#[utoipa::path(
    put,
    path = "/compensation_planning/pay_adjustments/{id}/approve",
    tag = "compensation planning",
    summary = "Approve pay adjustment",
    params(("id" = i64, Path, description = "Pay adjustment id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Pay adjustment approved", body = PayAdjustmentResponse),
        (status = 404, description = "Pay adjustment not found"),
        (status = 409, description = "Already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn approve_pay_adjustment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::PayAdjustments, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<PayAdjustmentResponse>> {
    let mut tx = state.db.begin().await?;
    let mut adjustments = PayAdjustments::new(&mut tx);
    let adjustment = adjustments
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Pay adjustment", id))?;
    let next = adjustment.status.apply(ApprovalAction::Approve)?;
    let adjustment = adjustments
        .transition(id, adjustment.status, next, permission.id, note.comment())
        .await?
        .ok_or_else(|| decided_concurrently("Pay adjustment", id))?;

    let mut salaries = Salaries::new(&mut tx);
    let pay_frequency = salaries
        .current_for_employee(adjustment.employee_id)
        .await?
        .map(|salary| salary.pay_frequency);
    let salary = salaries
        .create(&SalaryCreateDBRequest {
            employee_id: adjustment.employee_id,
            base_salary: adjustment.proposed_salary,
            pay_frequency,
            effective_date: Some(adjustment.effective_date),
            is_current: true,
        })
        .await?;
    tx.commit().await?;

    tracing::info!(adjustment_id = id, salary_id = salary.id, "Pay adjustment applied");
    Ok(ApiResponse::ok(adjustment).with_message("Pay adjustment approved and applied"))
}

/// Deny a pay adjustment
#[utoipa::path(
    put,
    path = "/compensation_planning/pay_adjustments/{id}/deny",
    tag = "compensation planning",
    summary = "Deny pay adjustment",
    params(("id" = i64, Path, description = "Pay adjustment id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Pay adjustment denied", body = PayAdjustmentResponse),
        (status = 404, description = "Pay adjustment not found"),
        (status = 409, description = "Already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn deny_pay_adjustment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::PayAdjustments, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<PayAdjustmentResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut adjustments = PayAdjustments::new(&mut conn);
    let adjustment = adjustments
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Pay adjustment", id))?;
    let next = adjustment.status.apply(ApprovalAction::Deny)?;
    let adjustment = adjustments
        .transition(id, adjustment.status, next, permission.id, note.comment())
        .await?
        .ok_or_else(|| decided_concurrently("Pay adjustment", id))?;
    Ok(ApiResponse::ok(adjustment).with_message("Pay adjustment denied"))
}

// Grade revisions

/// List grade revision requests
#[utoipa::path(
    get,
    path = "/compensation_planning/grade_revisions",
    tag = "compensation planning",
    summary = "List grade revisions",
    params(ListApprovalsQuery),
    responses(
        (status = 200, description = "Page of grade revisions", body = Paginated<GradeRevisionResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_grade_revisions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListApprovalsQuery>,
    _: RequiresPermission<resource::GradeRevisions, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<GradeRevisionResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ApprovalFilter {
        skip,
        limit,
        employee_id: None,
        grade_id: query.grade_id,
        status: query.status,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = GradeRevisions::new(&mut conn);
    let revisions = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(revisions, &query.pagination, total)))
}

/// Propose new pay band figures for a grade
#[utoipa::path(
    post,
    path = "/compensation_planning/grade_revisions",
    tag = "compensation planning",
    summary = "Create grade revision",
    request_body = GradeRevisionCreate,
    responses(
        (status = 201, description = "Grade revision requested", body = GradeRevisionResponse),
        (status = 400, description = "Validation failed or unknown grade"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_grade_revision(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::GradeRevisions, operation::Create>,
    ApiJson(request): ApiJson<GradeRevisionCreate>,
) -> Result<ApiResponse<GradeRevisionResponse>> {
    let request = request.validate(permission.id)?;
    let mut conn = state.db.acquire().await?;
    let revision = GradeRevisions::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(revision).with_message("Grade revision requested successfully"))
}

/// Get a grade revision request
#[utoipa::path(
    get,
    path = "/compensation_planning/grade_revisions/{id}",
    tag = "compensation planning",
    summary = "Get grade revision",
    params(("id" = i64, Path, description = "Grade revision id")),
    responses(
        (status = 200, description = "Grade revision", body = GradeRevisionResponse),
        (status = 404, description = "Grade revision not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_grade_revision(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::GradeRevisions, operation::ReadAll>,
) -> Result<ApiResponse<GradeRevisionResponse>> {
    let mut conn = state.db.acquire().await?;
    let revision = GradeRevisions::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Grade revision", id))?;
    Ok(ApiResponse::ok(revision))
}

/// Approve a grade revision, installing its figures as the grade's active pay band
#[utoipa::path(
    put,
    path = "/compensation_planning/grade_revisions/{id}/approve",
    tag = "compensation planning",
    summary = "Approve grade revision",
    params(("id" = i64, Path, description = "Grade revision id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Grade revision approved", body = GradeRevisionResponse),
        (status = 404, description = "Grade revision not found"),
        (status = 409, description = "Already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn approve_grade_revision(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::GradeRevisions, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<GradeRevisionResponse>> {
    let mut tx = state.db.begin().await?;
    let mut revisions = GradeRevisions::new(&mut tx);
    let revision = revisions
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Grade revision", id))?;
    let next = revision.status.apply(ApprovalAction::Approve)?;
    let revision = revisions
        .transition(id, revision.status, next, permission.id, note.comment())
        .await?
        .ok_or_else(|| decided_concurrently("Grade revision", id))?;

    let band = PayBands::new(&mut tx)
        .replace_for_grade(
            revision.grade_id,
            revision.proposed_min_salary,
            revision.proposed_mid_salary,
            revision.proposed_max_salary,
        )
        .await?;
    tx.commit().await?;

    tracing::info!(revision_id = id, band_id = band.id, "Grade revision applied");
    Ok(ApiResponse::ok(revision).with_message("Grade revision approved and applied"))
}

/// Deny a grade revision
#[utoipa::path(
    put,
    path = "/compensation_planning/grade_revisions/{id}/deny",
    tag = "compensation planning",
    summary = "Deny grade revision",
    params(("id" = i64, Path, description = "Grade revision id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Grade revision denied", body = GradeRevisionResponse),
        (status = 404, description = "Grade revision not found"),
        (status = 409, description = "Already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn deny_grade_revision(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::GradeRevisions, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<GradeRevisionResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut revisions = GradeRevisions::new(&mut conn);
    let revision = revisions
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Grade revision", id))?;
    let next = revision.status.apply(ApprovalAction::Deny)?;
    let revision = revisions
        .transition(id, revision.status, next, permission.id, note.comment())
        .await?
        .ok_or_else(|| decided_concurrently("Grade revision", id))?;
    Ok(ApiResponse::ok(revision).with_message("Grade revision denied"))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_approved_adjustment_becomes_current_salary(pool: PgPool) {
        let manager = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Surgery").await;
        let employee = create_test_employee(&pool, "surgeon@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&manager);

        server
            .post("/api/salaries")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": employee.id, "base_salary": "90000", "pay_frequency": "bi_weekly"}))
            .await
            .assert_status(StatusCode::CREATED);

        let requested = server
            .post("/api/compensation_planning/pay_adjustments")
            .add_header(&auth.0, &auth.1)
            .json(&json!({
                "employee_id": employee.id,
                "proposed_salary": "99000",
                "adjustment_type": "Promotion",
                "effective_date": "2025-08-01",
            }))
            .await;
        requested.assert_status(StatusCode::CREATED);
        let body: Value = requested.json();
        assert_eq!(body["data"]["current_salary"], "90000.00");
        assert_eq!(body["data"]["status"], "Pending");
        let id = body["data"]["adjustment_id"].as_i64().unwrap();

        let approved = server
            .put(&format!("/api/compensation_planning/pay_adjustments/{id}/approve"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"comment": "Well deserved"}))
            .await;
        approved.assert_status_ok();
        assert_eq!(approved.json::<Value>()["data"]["status"], "Approved");

        let current: Value = server
            .get(&format!("/api/salaries?employee_id={}&current_only=true", employee.id))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        let salary = &current["data"]["items"][0];
        assert_eq!(salary["base_salary"], "99000.00");
        assert_eq!(salary["pay_frequency"], "bi_weekly");
        assert_eq!(salary["effective_date"], "2025-08-01");

        server
            .put(&format!("/api/compensation_planning/pay_adjustments/{id}/deny"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_approved_revision_replaces_active_band(pool: PgPool) {
        let manager = create_test_user(&pool, Role::HrManager).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&manager);

        let grade = server
            .post("/api/compensation_planning/salary_grades")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"code": "sg-11", "name": "Nurse II"}))
            .await
            .json::<Value>()["data"]["grade_id"]
            .as_i64()
            .unwrap();
        server
            .post("/api/compensation_planning/pay_bands")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"grade_id": grade, "min_salary": "30000", "mid_salary": "35000", "max_salary": "40000"}))
            .await
            .assert_status(StatusCode::CREATED);

        let invalid = server
            .post("/api/compensation_planning/grade_revisions")
            .add_header(&auth.0, &auth.1)
            .json(&json!({
                "grade_id": grade,
                "proposed_min_salary": "36000",
                "proposed_mid_salary": "34000",
                "proposed_max_salary": "45000",
            }))
            .await;
        invalid.assert_status(StatusCode::BAD_REQUEST);
        assert!(invalid.json::<Value>()["error"]["proposed_mid_salary"].is_string());

        let revision = server
            .post("/api/compensation_planning/grade_revisions")
            .add_header(&auth.0, &auth.1)
            .json(&json!({
                "grade_id": grade,
                "proposed_min_salary": "32000",
                "proposed_mid_salary": "38000",
                "proposed_max_salary": "44000",
            }))
            .await
            .json::<Value>()["data"]["revision_id"]
            .as_i64()
            .unwrap();
        server
            .put(&format!("/api/compensation_planning/grade_revisions/{revision}/approve"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();

        let bands: Value = server
            .get(&format!("/api/compensation_planning/pay_bands?grade_id={grade}"))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(bands["data"]["pagination"]["total"], 1);
        assert_eq!(bands["data"]["items"][0]["mid_salary"], "38000.00");

        let history: Value = server
            .get(&format!("/api/compensation_planning/pay_bands?grade_id={grade}&include_inactive=true"))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(history["data"]["pagination"]["total"], 2);
    }

    #[sqlx::test]
    async fn test_grade_mappings_keep_one_current(pool: PgPool) {
        let manager = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Surgery").await;
        let employee = create_test_employee(&pool, "surgeon@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&manager);

        let mut grades = Vec::new();
        for code in ["SG-1", "SG-2"] {
            let id = server
                .post("/api/compensation_planning/salary_grades")
                .add_header(&auth.0, &auth.1)
                .json(&json!({"code": code, "name": code}))
                .await
                .json::<Value>()["data"]["grade_id"]
                .as_i64()
                .unwrap();
            grades.push(id);
        }

        let mut mappings = Vec::new();
        for grade in &grades {
            let id = server
                .post("/api/compensation_planning/grade_mappings")
                .add_header(&auth.0, &auth.1)
                .json(&json!({"employee_id": employee.id, "grade_id": grade}))
                .await
                .json::<Value>()["data"]["mapping_id"]
                .as_i64()
                .unwrap();
            mappings.push(id);
        }

        let current: Value = server
            .get(&format!("/api/compensation_planning/grade_mappings?employee_id={}&current_only=true", employee.id))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(current["data"]["pagination"]["total"], 1);
        assert_eq!(current["data"]["items"][0]["grade_id"], grades[1]);

        server
            .delete(&format!("/api/compensation_planning/grade_mappings/{}", mappings[0]))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/compensation_planning/grade_mappings/{}", mappings[0]))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
