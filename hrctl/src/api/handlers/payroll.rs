//! Payroll runs and payslips.
//!
//! A run is edited as a draft, then processed: processing moves it to `Processing`,
//! writes one payslip per eligible employee and totals the run, all in one transaction.

use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiQuery, EntityId, OptionalJson},
        models::{
            pagination::{Paginated, Pagination},
            payroll::{
                ListPayrollRunsQuery, ListPayslipsQuery, PayrollRunCreate, PayrollRunResponse, PayrollRunUpdate,
                PayslipResponse, ProcessedPayrollRun,
            },
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, operation, own_scope, require_read, resource},
    db::{
        errors::DbError,
        handlers::{
            PayrollRuns, Payslips, Repository,
            payroll::{PayrollRunFilter, PayslipFilter},
        },
    },
    errors::{Error, Result},
    lifecycle::{Lifecycle, PayrollAction, PayrollRunStatus, TransitionNote},
    types::{PayrollRunId, Resource, UserId},
};

/// Run changed status between our read and our write
fn changed_concurrently(id: PayrollRunId) -> Error {
    Error::Conflict {
        message: format!("Payroll run {id} was modified by another request"),
    }
}

/// Edits are only allowed on drafts
fn not_a_draft(status: PayrollRunStatus, action: &str) -> Error {
    Error::InvalidTransition {
        resource: PayrollRunStatus::ENTITY.to_string(),
        from: format!("{status:?}"),
        action: action.to_string(),
    }
}

async fn apply_action(
    state: &AppState,
    id: PayrollRunId,
    action: PayrollAction,
    actor: UserId,
    comment: Option<String>,
) -> Result<PayrollRunResponse> {
    let mut tx = state.db.begin().await?;
    let mut runs = PayrollRuns::new(&mut tx);
    let run = runs
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Payroll run", id))?;
    let next = run.status.apply(action)?;
    let run = runs
        .transition(id, run.status, next, actor, comment)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;
    tx.commit().await?;

    tracing::info!(run_id = id, status = ?run.status, "Payroll run {action}");
    Ok(run)
}

/// List payroll runs
#[utoipa::path(
    get,
    path = "/payroll/runs",
    tag = "payroll",
    summary = "List payroll runs",
    params(ListPayrollRunsQuery),
    responses(
        (status = 200, description = "Page of payroll runs", body = Paginated<PayrollRunResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_runs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPayrollRunsQuery>,
    _: RequiresPermission<resource::Payroll, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<PayrollRunResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = PayrollRunFilter {
        skip,
        limit,
        status: query.status,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = PayrollRuns::new(&mut conn);
    let runs = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(runs, &query.pagination, total)))
}

/// Create a draft payroll run
#[utoipa::path(
    post,
    path = "/payroll/runs",
    tag = "payroll",
    summary = "Create payroll run",
    request_body = PayrollRunCreate,
    responses(
        (status = 201, description = "Payroll run created", body = PayrollRunResponse),
        (status = 400, description = "Validation failed"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_run(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::Payroll, operation::Create>,
    ApiJson(request): ApiJson<PayrollRunCreate>,
) -> Result<ApiResponse<PayrollRunResponse>> {
    let request = request.validate(permission.id)?;
    let mut conn = state.db.acquire().await?;
    let run = PayrollRuns::new(&mut conn).create(&request).await?;
    Ok(ApiResponse::created(run).with_message("Payroll run created successfully"))
}

/// Get a payroll run
#[utoipa::path(
    get,
    path = "/payroll/runs/{id}",
    tag = "payroll",
    summary = "Get payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    responses(
        (status = 200, description = "Payroll run", body = PayrollRunResponse),
        (status = 404, description = "Payroll run not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Payroll, operation::ReadAll>,
) -> Result<ApiResponse<PayrollRunResponse>> {
    let mut conn = state.db.acquire().await?;
    let run = PayrollRuns::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Payroll run", id))?;
    Ok(ApiResponse::ok(run))
}

/// Update a draft payroll run
#[utoipa::path(
    patch,
    path = "/payroll/runs/{id}",
    tag = "payroll",
    summary = "Update payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    request_body = PayrollRunUpdate,
    responses(
        (status = 200, description = "Payroll run updated", body = PayrollRunResponse),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Run is no longer a draft"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Payroll, operation::Update>,
    ApiJson(request): ApiJson<PayrollRunUpdate>,
) -> Result<ApiResponse<PayrollRunResponse>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = PayrollRuns::new(&mut conn);
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Payroll run", id))?;
    if existing.status != PayrollRunStatus::Draft {
        return Err(not_a_draft(existing.status, "update"));
    }

    let request = request.validate(&existing)?;
    let run = repo.update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => changed_concurrently(id),
        other => other.into(),
    })?;
    Ok(ApiResponse::ok(run).with_message("Payroll run updated successfully"))
}

/// Delete a draft payroll run
#[utoipa::path(
    delete,
    path = "/payroll/runs/{id}",
    tag = "payroll",
    summary = "Delete payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    responses(
        (status = 200, description = "Payroll run deleted"),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Run is no longer a draft"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Payroll, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = PayrollRuns::new(&mut conn);
    if repo.delete(id).await? {
        return Ok(ApiResponse::message_only("Payroll run deleted successfully"));
    }
    match repo.get_by_id(id).await? {
        Some(run) => Err(not_a_draft(run.status, "delete")),
        None => Err(Error::not_found("Payroll run", id)),
    }
}

/// Process a draft run into payslips
#[utoipa::path(
    put,
    path = "/payroll/runs/{id}/process",
    tag = "payroll",
    summary = "Process payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    responses(
        (status = 200, description = "Payslips generated", body = ProcessedPayrollRun),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Run is not a draft"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn process_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::Payroll, operation::Approve>,
) -> Result<ApiResponse<ProcessedPayrollRun>> {
    let mut tx = state.db.begin().await?;
    let mut runs = PayrollRuns::new(&mut tx);
    let run = runs
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Payroll run", id))?;
    let next = run.status.apply(PayrollAction::Process)?;
    let run = runs
        .transition(id, run.status, next, permission.id, None)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    let payslips_generated = runs.generate_payslips(&run).await?;
    let run = runs.refresh_totals(id).await?;
    tx.commit().await?;

    tracing::info!(run_id = id, payslips_generated, total_net = %run.total_net, "Payroll run processed");
    Ok(ApiResponse::ok(ProcessedPayrollRun { run, payslips_generated }).with_message("Payroll run processed successfully"))
}

/// Complete a processed run
#[utoipa::path(
    put,
    path = "/payroll/runs/{id}/complete",
    tag = "payroll",
    summary = "Complete payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Payroll run completed", body = PayrollRunResponse),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Run is not processing"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn complete_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::Payroll, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<PayrollRunResponse>> {
    let run = apply_action(&state, id, PayrollAction::Complete, permission.id, note.comment()).await?;
    Ok(ApiResponse::ok(run).with_message("Payroll run completed successfully"))
}

/// Cancel a draft or processing run
#[utoipa::path(
    put,
    path = "/payroll/runs/{id}/cancel",
    tag = "payroll",
    summary = "Cancel payroll run",
    params(("id" = i64, Path, description = "Payroll run id")),
    request_body(content = TransitionNote, description = "Optional comment"),
    responses(
        (status = 200, description = "Payroll run cancelled", body = PayrollRunResponse),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Run is already final"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn cancel_run(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    permission: RequiresPermission<resource::Payroll, operation::Approve>,
    OptionalJson(note): OptionalJson<TransitionNote>,
) -> Result<ApiResponse<PayrollRunResponse>> {
    let run = apply_action(&state, id, PayrollAction::Cancel, permission.id, note.comment()).await?;
    Ok(ApiResponse::ok(run).with_message("Payroll run cancelled successfully"))
}

/// Payslips generated by a run
#[utoipa::path(
    get,
    path = "/payroll/runs/{id}/payslips",
    tag = "payroll",
    summary = "List run payslips",
    params(("id" = i64, Path, description = "Payroll run id"), Pagination),
    responses(
        (status = 200, description = "Page of payslips", body = Paginated<PayslipResponse>),
        (status = 404, description = "Payroll run not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_run_payslips(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ApiQuery(pagination): ApiQuery<Pagination>,
    _: RequiresPermission<resource::Payroll, operation::ReadAll>,
) -> Result<ApiResponse<Paginated<PayslipResponse>>> {
    let mut conn = state.db.acquire().await?;
    if PayrollRuns::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(Error::not_found("Payroll run", id));
    }

    let (skip, limit) = pagination.params();
    let filter = PayslipFilter {
        skip,
        limit,
        run_id: Some(id),
        ..Default::default()
    };
    let mut repo = Payslips::new(&mut conn);
    let payslips = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(payslips, &pagination, total)))
}

/// List payslips
///
/// Callers without payroll access only ever see their own payslips, whatever filter
/// they pass.
#[utoipa::path(
    get,
    path = "/payroll/payslips",
    tag = "payroll",
    summary = "List payslips",
    params(ListPayslipsQuery),
    responses(
        (status = 200, description = "Page of payslips", body = Paginated<PayslipResponse>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payslips(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPayslipsQuery>,
    current_user: CurrentUser,
) -> Result<ApiResponse<Paginated<PayslipResponse>>> {
    let scope = own_scope(&current_user, Resource::Payroll)?;

    let (skip, limit) = query.pagination.params();
    let filter = PayslipFilter {
        skip,
        limit,
        run_id: query.run_id,
        employee_id: scope.or(query.employee_id),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Payslips::new(&mut conn);
    let payslips = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(payslips, &query.pagination, total)))
}

/// Get a payslip
#[utoipa::path(
    get,
    path = "/payroll/payslips/{id}",
    tag = "payroll",
    summary = "Get payslip",
    params(("id" = i64, Path, description = "Payslip id")),
    responses(
        (status = 200, description = "Payslip", body = PayslipResponse),
        (status = 403, description = "Not your payslip"),
        (status = 404, description = "Payslip not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_payslip(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<PayslipResponse>> {
    let mut conn = state.db.acquire().await?;
    let payslip = Payslips::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Payslip", id))?;
    require_read(&current_user, Resource::Payroll, payslip.employee_id)?;
    Ok(ApiResponse::ok(payslip))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{
        add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user,
        create_test_user_for_employee,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    async fn create_run(server: &TestServer, auth: &(String, String)) -> i64 {
        let response = server
            .post("/api/payroll/runs")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"period_start": "2025-06-01", "period_end": "2025-06-30", "pay_date": "2025-07-05"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "Draft");
        body["data"]["run_id"].as_i64().unwrap()
    }

    #[sqlx::test]
    async fn test_process_generates_payslips_and_totals(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let department = create_test_department(&pool, "Emergency").await;
        let paid = create_test_employee(&pool, "er-nurse@hospital.local", department.id).await;
        // No current salary, so no payslip
        create_test_employee(&pool, "volunteer@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&officer);

        server
            .post("/api/salaries")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": paid.id, "base_salary": "30000", "pay_frequency": "semi_monthly"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/bonuses")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": paid.id, "bonus_type": "Night shift", "amount": "2000", "award_date": "2025-06-15"}))
            .await
            .assert_status(StatusCode::CREATED);
        // Outside the period
        server
            .post("/api/bonuses")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": paid.id, "bonus_type": "Holiday", "amount": "9999", "award_date": "2025-12-20"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/deductions")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": paid.id, "deduction_type": "Loan", "amount": "1500", "is_recurring": true, "start_date": "2025-01-01"}))
            .await
            .assert_status(StatusCode::CREATED);

        let run_id = create_run(&server, &auth).await;
        let response = server
            .put(&format!("/api/payroll/runs/{run_id}/process"))
            .add_header(&auth.0, &auth.1)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["payslips_generated"], 1);
        assert_eq!(body["data"]["run"]["status"], "Processing");
        assert_eq!(body["data"]["run"]["total_gross"], "17000.00");
        assert_eq!(body["data"]["run"]["total_deductions"], "1500.00");
        assert_eq!(body["data"]["run"]["total_net"], "15500.00");

        let payslips: Value = server
            .get(&format!("/api/payroll/runs/{run_id}/payslips"))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        let payslip = &payslips["data"]["items"][0];
        assert_eq!(payslip["employee_id"], paid.id);
        assert_eq!(payslip["basic_pay"], "15000.00");
        assert_eq!(payslip["total_bonuses"], "2000.00");
        assert_eq!(payslip["net_pay"], "15500.00");

        // Processing is one-way
        server
            .put(&format!("/api/payroll/runs/{run_id}/process"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::CONFLICT);

        let completed = server
            .put(&format!("/api/payroll/runs/{run_id}/complete"))
            .add_header(&auth.0, &auth.1)
            .await;
        completed.assert_status_ok();
        assert_eq!(completed.json::<Value>()["data"]["status"], "Completed");

        server
            .put(&format!("/api/payroll/runs/{run_id}/cancel"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"reason": "too late"}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_only_drafts_can_be_edited_or_deleted(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&officer);

        let run_id = create_run(&server, &auth).await;
        let response = server
            .patch(&format!("/api/payroll/runs/{run_id}"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"period_end": "2025-05-01"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"]["period_end"].is_string());

        let cancelled = server
            .put(&format!("/api/payroll/runs/{run_id}/cancel"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"reason": "wrong period"}))
            .await;
        cancelled.assert_status_ok();
        assert_eq!(cancelled.json::<Value>()["data"]["status_comment"], "wrong period");

        server
            .patch(&format!("/api/payroll/runs/{run_id}"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"notes": "edited"}))
            .await
            .assert_status(StatusCode::CONFLICT);
        server
            .delete(&format!("/api/payroll/runs/{run_id}"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::CONFLICT);

        let draft = create_run(&server, &auth).await;
        server
            .delete(&format!("/api/payroll/runs/{draft}"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/payroll/runs/{draft}"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_employees_see_only_their_own_payslips(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let department = create_test_department(&pool, "Emergency").await;
        let me = create_test_employee(&pool, "me@hospital.local", department.id).await;
        let other = create_test_employee(&pool, "other@hospital.local", department.id).await;
        let user = create_test_user_for_employee(&pool, Role::Employee, me.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&officer);

        for employee in [me.id, other.id] {
            server
                .post("/api/salaries")
                .add_header(&auth.0, &auth.1)
                .json(&json!({"employee_id": employee, "base_salary": "20000"}))
                .await
                .assert_status(StatusCode::CREATED);
        }
        let run_id = create_run(&server, &auth).await;
        server
            .put(&format!("/api/payroll/runs/{run_id}/process"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();

        let own = add_auth_headers(&user);
        let mine: Value = server
            .get(&format!("/api/payroll/payslips?employee_id={}", other.id))
            .add_header(&own.0, &own.1)
            .await
            .json();
        assert_eq!(mine["data"]["pagination"]["total"], 1);
        assert_eq!(mine["data"]["items"][0]["employee_id"], me.id);

        let all: Value = server
            .get("/api/payroll/payslips")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(all["data"]["pagination"]["total"], 2);
        let theirs = all["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["employee_id"] == other.id)
            .unwrap()["payslip_id"]
            .as_i64()
            .unwrap();

        server
            .get(&format!("/api/payroll/payslips/{theirs}"))
            .add_header(&own.0, &own.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get(&format!("/api/payroll/runs/{run_id}"))
            .add_header(&own.0, &own.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
