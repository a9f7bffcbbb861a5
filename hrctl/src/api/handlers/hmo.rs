//! HMO catalog (providers and plans), enrollments and claims.

use axum::extract::State;
use chrono::Utc;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId, OptionalJson},
        models::{
            branches::ListCatalogQuery,
            hmo::{
                ClaimCreate, ClaimResponse, EnrollmentCreate, EnrollmentResponse, EnrollmentTermination, HmoPlanCreate,
                HmoPlanResponse, HmoPlanUpdate, HmoProviderCreate, HmoProviderResponse, HmoProviderUpdate, ListClaimsQuery,
                ListEnrollmentsQuery, ListPlansQuery,
            },
            pagination::Paginated,
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, operation, own_scope, require_create, require_read, resource},
    db::handlers::{
        Claims, Deductions, Enrollments, HmoPlans, HmoProviders, Repository,
        branches::CatalogFilter,
        hmo::{ClaimFilter, EnrollmentFilter, HmoPlanFilter},
    },
    errors::{Error, Result},
    lifecycle::{ClaimAction, EnrollmentAction, EnrollmentStatus, Lifecycle, TransitionNote},
    types::{ClaimId, Resource, UserId},
};

// Providers

/// List HMO providers
#[utoipa::path(
    get,
    path = "/hmo/providers",
    tag = "hmo",
    summary = "List HMO providers",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Page of providers", body = Paginated<HmoProviderResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_providers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCatalogQuery>,
    _: RequiresPermission<resource::HmoCatalog, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<HmoProviderResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CatalogFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
        ..CatalogFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = HmoProviders::new(&mut conn);
    let providers = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(providers, &query.pagination, total)))
}

/// Create an HMO provider
#[utoipa::path(
    post,
    path = "/hmo/providers",
    tag = "hmo",
    summary = "Create HMO provider",
    request_body = HmoProviderCreate,
    responses(
        (status = 201, description = "Provider created", body = HmoProviderResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Name already in use"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_provider(
    State(state): State<AppState>,
    _: RequiresPermission<resource::HmoCatalog, operation::Create>,
    ApiJson(request): ApiJson<HmoProviderCreate>,
) -> Result<ApiResponse<HmoProviderResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let provider = HmoProviders::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(provider).with_message("HMO provider created successfully"))
}

/// Get an HMO provider
#[utoipa::path(
    get,
    path = "/hmo/providers/{id}",
    tag = "hmo",
    summary = "Get HMO provider",
    params(("id" = i64, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider", body = HmoProviderResponse),
        (status = 404, description = "Provider not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_provider(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::ReadAll>,
) -> Result<ApiResponse<HmoProviderResponse>> {
    let mut conn = state.db.acquire().await?;
    let provider = HmoProviders::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("HMO provider", id))?;
    Ok(ApiResponse::ok(provider))
}

/// Update an HMO provider
#[utoipa::path(
    patch,
    path = "/hmo/providers/{id}",
    tag = "hmo",
    summary = "Update HMO provider",
    params(("id" = i64, Path, description = "Provider id")),
    request_body = HmoProviderUpdate,
    responses(
        (status = 200, description = "Provider updated", body = HmoProviderResponse),
        (status = 404, description = "Provider not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_provider(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::Update>,
    ApiJson(request): ApiJson<HmoProviderUpdate>,
) -> Result<ApiResponse<HmoProviderResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let provider = HmoProviders::new(&mut conn)
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "HMO provider", id))?;
    Ok(ApiResponse::ok(provider).with_message("HMO provider updated successfully"))
}

/// Deactivate an HMO provider
#[utoipa::path(
    delete,
    path = "/hmo/providers/{id}",
    tag = "hmo",
    summary = "Deactivate HMO provider",
    params(("id" = i64, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider deactivated"),
        (status = 404, description = "Provider not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_provider(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !HmoProviders::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("HMO provider", id));
    }
    Ok(ApiResponse::message_only("HMO provider deactivated successfully"))
}

// Plans

/// List HMO plans
#[utoipa::path(
    get,
    path = "/hmo/plans",
    tag = "hmo",
    summary = "List HMO plans",
    params(ListPlansQuery),
    responses(
        (status = 200, description = "Page of plans", body = Paginated<HmoPlanResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPlansQuery>,
    _: RequiresPermission<resource::HmoCatalog, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<HmoPlanResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = HmoPlanFilter {
        skip,
        limit,
        provider_id: query.provider_id,
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = HmoPlans::new(&mut conn);
    let plans = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(plans, &query.pagination, total)))
}

/// Create an HMO plan
#[utoipa::path(
    post,
    path = "/hmo/plans",
    tag = "hmo",
    summary = "Create HMO plan",
    request_body = HmoPlanCreate,
    responses(
        (status = 201, description = "Plan created", body = HmoPlanResponse),
        (status = 400, description = "Validation failed or unknown provider"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_plan(
    State(state): State<AppState>,
    _: RequiresPermission<resource::HmoCatalog, operation::Create>,
    ApiJson(request): ApiJson<HmoPlanCreate>,
) -> Result<ApiResponse<HmoPlanResponse>> {
    let request = request.validate()?;
    let mut conn = state.db.acquire().await?;
    let plan = HmoPlans::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(plan).with_message("HMO plan created successfully"))
}

/// Get an HMO plan
#[utoipa::path(
    get,
    path = "/hmo/plans/{id}",
    tag = "hmo",
    summary = "Get HMO plan",
    params(("id" = i64, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan", body = HmoPlanResponse),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_plan(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::ReadAll>,
) -> Result<ApiResponse<HmoPlanResponse>> {
    let mut conn = state.db.acquire().await?;
    let plan = HmoPlans::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("HMO plan", id))?;
    Ok(ApiResponse::ok(plan))
}

/// Update an HMO plan
#[utoipa::path(
    patch,
    path = "/hmo/plans/{id}",
    tag = "hmo",
    summary = "Update HMO plan",
    params(("id" = i64, Path, description = "Plan id")),
    request_body = HmoPlanUpdate,
    responses(
        (status = 200, description = "Plan updated", body = HmoPlanResponse),
        (status = 400, description = "Employee share exceeds the premium"),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_plan(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::Update>,
    ApiJson(request): ApiJson<HmoPlanUpdate>,
) -> Result<ApiResponse<HmoPlanResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = HmoPlans::new(&mut conn);
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("HMO plan", id))?;
    let request = request.validate(&existing)?;
    let plan = repo
        .update(id, &request)
        .await
        .map_err(|e| Error::from_lookup(e, "HMO plan", id))?;
    Ok(ApiResponse::ok(plan).with_message("HMO plan updated successfully"))
}

/// Deactivate an HMO plan
#[utoipa::path(
    delete,
    path = "/hmo/plans/{id}",
    tag = "hmo",
    summary = "Deactivate HMO plan",
    params(("id" = i64, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan deactivated"),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_plan(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::HmoCatalog, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !HmoPlans::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("HMO plan", id));
    }
    Ok(ApiResponse::message_only("HMO plan deactivated successfully"))
}

// Enrollments

/// List HMO enrollments
#[utoipa::path(
    get,
    path = "/hmo/enrollments",
    tag = "hmo",
    summary = "List enrollments",
    params(ListEnrollmentsQuery),
    responses(
        (status = 200, description = "Page of enrollments", body = Paginated<EnrollmentResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEnrollmentsQuery>,
    current_user: CurrentUser,
) -> Result<ApiResponse<Paginated<EnrollmentResponse>>> {
    let scope = own_scope(&current_user, Resource::HmoEnrollments)?;

    let (skip, limit) = query.pagination.params();
    let filter = EnrollmentFilter {
        skip,
        limit,
        employee_id: scope.or(query.employee_id),
        plan_id: query.plan_id,
        status: query.status,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Enrollments::new(&mut conn);
    let enrollments = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(enrollments, &query.pagination, total)))
}

/// Enroll an employee in a plan
#[utoipa::path(
    post,
    path = "/hmo/enrollments",
    tag = "hmo",
    summary = "Create enrollment",
    request_body = EnrollmentCreate,
    responses(
        (status = 201, description = "Employee enrolled", body = EnrollmentResponse),
        (status = 400, description = "Validation failed, unknown employee or inactive plan"),
        (status = 409, description = "Employee already has an active enrollment in this plan"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_enrollment(
    State(state): State<AppState>,
    _: RequiresPermission<resource::HmoEnrollments, operation::Create>,
    ApiJson(request): ApiJson<EnrollmentCreate>,
) -> Result<ApiResponse<EnrollmentResponse>> {
    let request = request.validate()?;

    let mut conn = state.db.acquire().await?;
    let plan = HmoPlans::new(&mut conn).get_by_id(request.plan_id).await?;
    match plan {
        Some(plan) if plan.is_active => {}
        Some(plan) => {
            return Err(Error::BadRequest {
                message: format!("HMO plan {} is no longer offered", plan.name),
            });
        }
        None => {
            return Err(Error::BadRequest {
                message: format!("HMO plan with ID {} does not exist", request.plan_id),
            });
        }
    }

    let enrollment = Enrollments::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(enrollment).with_message("Employee enrolled successfully"))
}

/// Get an enrollment
#[utoipa::path(
    get,
    path = "/hmo/enrollments/{id}",
    tag = "hmo",
    summary = "Get enrollment",
    params(("id" = i64, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment", body = EnrollmentResponse),
        (status = 403, description = "Not your enrollment"),
        (status = 404, description = "Enrollment not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_enrollment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<EnrollmentResponse>> {
    let mut conn = state.db.acquire().await?;
    let enrollment = Enrollments::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Enrollment", id))?;
    require_read(&current_user, Resource::HmoEnrollments, enrollment.employee_id)?;
    Ok(ApiResponse::ok(enrollment))
}

/// Terminate an active enrollment
///
/// The enrollment's premium deduction stops in the same transaction.
#[utoipa::path(
    put,
    path = "/hmo/enrollments/{id}/terminate",
    tag = "hmo",
    summary = "Terminate enrollment",
    params(("id" = i64, Path, description = "Enrollment id")),
    request_body(content = EnrollmentTermination, description = "Optional end date and reason"),
    responses(
        (status = 200, description = "Enrollment terminated", body = EnrollmentResponse),
        (status = 404, description = "Enrollment not found"),
        (status = 409, description = "Enrollment already terminated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn terminate_enrollment(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::HmoEnrollments, operation::Update>,
    OptionalJson(request): OptionalJson<EnrollmentTermination>,
) -> Result<ApiResponse<EnrollmentResponse>> {
    let details = request.validate(Utc::now().date_naive())?;

    let mut tx = state.db.begin().await?;
    let mut enrollments = Enrollments::new(&mut tx);
    let enrollment = enrollments
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Enrollment", id))?;
    enrollment.status.apply(EnrollmentAction::Terminate)?;
    if details.end_date < enrollment.start_date {
        return Err(Error::BadRequest {
            message: format!("end_date must not be before the enrollment start date {}", enrollment.start_date),
        });
    }

    let enrollment = enrollments
        .terminate(id, details.end_date, permission.id, details.reason)
        .await?
        .ok_or_else(|| Error::InvalidTransition {
            resource: EnrollmentStatus::ENTITY.to_string(),
            from: format!("{:?}", EnrollmentStatus::Terminated),
            action: EnrollmentAction::Terminate.to_string(),
        })?;
    let premium_stopped = Deductions::new(&mut tx).end_for_enrollment(id, details.end_date).await?;
    tx.commit().await?;

    tracing::info!(enrollment_id = id, premium_stopped, "Enrollment terminated");
    Ok(ApiResponse::ok(enrollment).with_message("Enrollment terminated successfully"))
}

// Claims

async fn apply_claim_action(
    state: &AppState,
    id: ClaimId,
    action: ClaimAction,
    actor: UserId,
    comment: Option<String>,
) -> Result<ClaimResponse> {
    let mut tx = state.db.begin().await?;
    let mut claims = Claims::new(&mut tx);
    let claim = claims
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Claim", id))?;
    let next = claim.status.apply(action)?;
    let claim = claims
        .transition(id, claim.status, next, actor, comment)
        .await?
        .ok_or_else(|| Error::Conflict {
            message: format!("Claim {id} was modified by another request"),
        })?;
    tx.commit().await?;

    tracing::info!(claim_id = id, status = ?claim.status, "Claim {action}");
    Ok(claim)
}

/// List HMO claims
#[utoipa::path(
    get,
    path = "/hmo/claims",
    tag = "hmo",
    summary = "List claims",
    params(ListClaimsQuery),
    responses(
        (status = 200, description = "Page of claims", body = Paginated<ClaimResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_claims(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListClaimsQuery>,
    current_user: CurrentUser,
) -> Result<ApiResponse<Paginated<ClaimResponse>>> {
    let scope = own_scope(&current_user, Resource::HmoClaims)?;

    let (skip, limit) = query.pagination.params();
    let filter = ClaimFilter {
        skip,
        limit,
        enrollment_id: query.enrollment_id,
        employee_id: scope.or(query.employee_id),
        status: query.status,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Claims::new(&mut conn);
    let claims = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(claims, &query.pagination, total)))
}

/// File a claim against an active enrollment
#[utoipa::path(
    post,
    path = "/hmo/claims",
    tag = "hmo",
    summary = "Create claim",
    request_body = ClaimCreate,
    responses(
        (status = 201, description = "Claim filed", body = ClaimResponse),
        (status = 400, description = "Validation failed or enrollment not active"),
        (status = 403, description = "Not your enrollment"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_claim(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<ClaimCreate>,
) -> Result<ApiResponse<ClaimResponse>> {
    let request = request.validate()?;

    let mut tx = state.db.begin().await?;
    let enrollment = Enrollments::new(&mut tx)
        .get_by_id(request.enrollment_id)
        .await?
        .ok_or_else(|| Error::BadRequest {
            message: format!("Enrollment with ID {} does not exist", request.enrollment_id),
        })?;
    require_create(&current_user, Resource::HmoClaims, enrollment.employee_id)?;
    if enrollment.status != EnrollmentStatus::Active {
        return Err(Error::BadRequest {
            message: "Claims can only be filed against an active enrollment".to_string(),
        });
    }

    let claim = Claims::new(&mut tx).create(&request).await?;
    tx.commit().await?;
    Ok(ApiResponse::created(claim).with_message("Claim filed successfully"))
}

/// Get a claim
#[utoipa::path(
    get,
    path = "/hmo/claims/{id}",
    tag = "hmo",
    summary = "Get claim",
    params(("id" = i64, Path, description = "Claim id")),
    responses(
        (status = 200, description = "Claim", body = ClaimResponse),
        (status = 403, description = "Not your claim"),
        (status = 404, description = "Claim not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_claim(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<ClaimResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut claims = Claims::new(&mut conn);
    let owner = claims.owner(id).await?.ok_or_else(|| Error::not_found("Claim", id))?;
    require_read(&current_user, Resource::HmoClaims, owner)?;
    let claim = claims.get_by_id(id).await?.ok_or_else(|| Error::not_found("Claim", id))?;
    Ok(ApiResponse::ok(claim))
}

/// Put a pending claim under review
#[utoipa::path(
    put,
    path = "/hmo/claims/{id}/review",
    tag = "hmo",
    summary = "Review claim",
    params(("id" = i64, Path, description = "Claim id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Claim under review", body = ClaimResponse),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Claim is not pending"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn review_claim(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::HmoClaims, operation::Update>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<ClaimResponse>> {
    let claim = apply_claim_action(&state, id, ClaimAction::Review, permission.id, note.comment()).await?;
    Ok(ApiResponse::ok(claim).with_message("Claim placed under review"))
}

/// Approve a claim
#[utoipa::path(
    put,
    path = "/hmo/claims/{id}/approve",
    tag = "hmo",
    summary = "Approve claim",
    params(("id" = i64, Path, description = "Claim id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Claim approved", body = ClaimResponse),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Claim already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn approve_claim(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::HmoClaims, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<ClaimResponse>> {
    let claim = apply_claim_action(&state, id, ClaimAction::Approve, permission.id, note.comment()).await?;
    Ok(ApiResponse::ok(claim).with_message("Claim approved"))
}

/// Deny a claim
#[utoipa::path(
    put,
    path = "/hmo/claims/{id}/deny",
    tag = "hmo",
    summary = "Deny claim",
    params(("id" = i64, Path, description = "Claim id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Claim denied", body = ClaimResponse),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Claim already decided"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn deny_claim(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::HmoClaims, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<ClaimResponse>> {
    let claim = apply_claim_action(&state, id, ClaimAction::Deny, permission.id, note.comment()).await?;
    Ok(ApiResponse::ok(claim).with_message("Claim denied"))
}
