use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::ApiQuery,
        models::{
            reports::{
                BenefitsReportRow, DashboardSummary, DateRangeQuery, HeadcountRow, HmoClaimsReportRow, PayrollSummaryQuery,
                PayrollSummaryRow,
            },
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::Reports,
    errors::Result,
};

/// Active and inactive employees per department
#[utoipa::path(
    get,
    path = "/reports/headcount",
    tag = "reports",
    summary = "Headcount report",
    responses(
        (status = 200, description = "One row per department", body = Vec<HeadcountRow>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn headcount_report(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Reports, operation::ReadAll>,
) -> Result<ApiResponse<Vec<HeadcountRow>>> {
    let mut conn = state.db.acquire().await?;
    let rows = Reports::new(&mut conn).headcount().await?;
    Ok(ApiResponse::ok(rows))
}

/// Per-employee pay totals for one run or a date range
#[utoipa::path(
    get,
    path = "/reports/payroll_summary",
    tag = "reports",
    summary = "Payroll summary report",
    params(PayrollSummaryQuery, DateRangeQuery),
    responses(
        (status = 200, description = "One row per employee", body = Vec<PayrollSummaryRow>),
        (status = 400, description = "Invalid date range"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn payroll_summary_report(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PayrollSummaryQuery>,
    _: RequiresPermission<resource::Reports, operation::ReadAll>,
) -> Result<ApiResponse<Vec<PayrollSummaryRow>>> {
    let scope = query.scope()?;
    let mut conn = state.db.acquire().await?;
    let rows = Reports::new(&mut conn).payroll_summary(scope).await?;
    Ok(ApiResponse::ok(rows))
}

/// Active assignments and their value per benefit
#[utoipa::path(
    get,
    path = "/reports/benefits",
    tag = "reports",
    summary = "Benefits report",
    responses(
        (status = 200, description = "One row per benefit", body = Vec<BenefitsReportRow>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn benefits_report(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Reports, operation::ReadAll>,
) -> Result<ApiResponse<Vec<BenefitsReportRow>>> {
    let mut conn = state.db.acquire().await?;
    let rows = Reports::new(&mut conn).benefits().await?;
    Ok(ApiResponse::ok(rows))
}

/// Claim counts and amounts per plan and status
#[utoipa::path(
    get,
    path = "/reports/hmo_claims",
    tag = "reports",
    summary = "HMO claims report",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "One row per provider, plan and status", body = Vec<HmoClaimsReportRow>),
        (status = 400, description = "Invalid date range"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn hmo_claims_report(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
    _: RequiresPermission<resource::Reports, operation::ReadAll>,
) -> Result<ApiResponse<Vec<HmoClaimsReportRow>>> {
    let (from, to) = query.range()?;
    let mut conn = state.db.acquire().await?;
    let rows = Reports::new(&mut conn).hmo_claims(from, to).await?;
    Ok(ApiResponse::ok(rows))
}

/// Organisation-wide counters for the landing page
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "reports",
    summary = "Dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardSummary),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Dashboard, operation::ReadAll>,
) -> Result<ApiResponse<DashboardSummary>> {
    let mut conn = state.db.acquire().await?;
    let summary = Reports::new(&mut conn).dashboard().await?;
    Ok(ApiResponse::ok(summary))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_headcount_report(pool: PgPool) {
        let staff = create_test_user(&pool, Role::HrStaff).await;
        let icu = create_test_department(&pool, "ICU").await;
        create_test_department(&pool, "Pharmacy").await;
        create_test_employee(&pool, "a@hospital.local", icu.id).await;
        create_test_employee(&pool, "b@hospital.local", icu.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&staff);

        let body: Value = server.get("/api/reports/headcount").add_header(&auth.0, &auth.1).await.json();
        let rows = body["data"].as_array().unwrap();
        let icu_row = rows.iter().find(|r| r["department"] == "ICU").unwrap();
        assert_eq!(icu_row["active"], 2);
        let pharmacy = rows.iter().find(|r| r["department"] == "Pharmacy").unwrap();
        assert_eq!(pharmacy["total"], 0);
    }

    #[sqlx::test]
    async fn test_report_range_and_access(pool: PgPool) {
        let officer = create_test_user(&pool, Role::PayrollOfficer).await;
        let manager = create_test_user(&pool, Role::Manager).await;
        let server = create_test_app(pool);

        let auth = add_auth_headers(&officer);
        server
            .get("/api/reports/hmo_claims?from=2025-02-01&to=2025-01-01")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        let body: Value = server
            .get("/api/reports/payroll_summary?from=2025-01-01&to=2025-01-31")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(body["data"], serde_json::json!([]));

        let auth = add_auth_headers(&manager);
        server
            .get("/api/reports/benefits")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_dashboard_is_open_to_everyone(pool: PgPool) {
        let employee = create_test_user(&pool, Role::Employee).await;
        let department = create_test_department(&pool, "ICU").await;
        create_test_employee(&pool, "a@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&employee);

        let body: Value = server.get("/api/dashboard").add_header(&auth.0, &auth.1).await.json();
        assert_eq!(body["data"]["active_employees"], 1);
        assert_eq!(body["data"]["departments"], 1);
        assert_eq!(body["data"]["open_payroll_runs"], 0);
        assert!(body["data"]["last_completed_run"].is_null());
    }
}
