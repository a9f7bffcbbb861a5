//! Bridges between modules. Today that is HMO premiums flowing into payroll deductions.

use axum::extract::State;

use crate::{
    AppState,
    api::models::{hmo::PremiumSyncSummary, response::ApiResponse},
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Deductions, Enrollments},
        models::hmo::PremiumDeduction,
    },
    errors::Result,
};

/// Premiums that active HMO enrollments contribute to payroll
#[utoipa::path(
    get,
    path = "/integrations/hmo_payroll/premiums",
    tag = "integrations",
    summary = "List HMO premiums",
    responses(
        (status = 200, description = "Employee share per active enrollment", body = Vec<PremiumDeduction>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_premiums(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Integrations, operation::ReadAll>,
) -> Result<ApiResponse<Vec<PremiumDeduction>>> {
    let mut conn = state.db.acquire().await?;
    let premiums = Enrollments::new(&mut conn).premium_deductions().await?;
    Ok(ApiResponse::ok(premiums))
}

/// Bring recurring premium deductions in line with active enrollments
#[utoipa::path(
    post,
    path = "/integrations/hmo_payroll/sync",
    tag = "integrations",
    summary = "Sync HMO premiums",
    responses(
        (status = 200, description = "Deductions created, updated and deactivated", body = PremiumSyncSummary),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_premiums(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Integrations, operation::Update>,
) -> Result<ApiResponse<PremiumSyncSummary>> {
    let mut tx = state.db.begin().await?;
    let premiums = Enrollments::new(&mut tx).premium_deductions().await?;

    let mut summary = PremiumSyncSummary::default();
    let mut deductions = Deductions::new(&mut tx);
    for premium in &premiums {
        let inserted = deductions
            .upsert_premium(premium.enrollment_id, premium.employee_id, premium.employee_share, premium.start_date)
            .await?;
        if inserted {
            summary.created += 1;
        } else {
            summary.updated += 1;
        }
    }
    summary.deactivated = deductions.deactivate_stale_premiums().await?;
    tx.commit().await?;

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        deactivated = summary.deactivated,
        "HMO premiums synced"
    );
    Ok(ApiResponse::ok(summary).with_message("HMO premiums synced to payroll deductions"))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_sync_is_idempotent(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Laboratory").await;
        let employee = create_test_employee(&pool, "medtech@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&hr);

        let provider = server
            .post("/api/hmo/providers")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"name": "Maxicare"}))
            .await
            .json::<Value>()["data"]["provider_id"]
            .as_i64()
            .unwrap();
        let plan = server
            .post("/api/hmo/plans")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"provider_id": provider, "name": "Gold", "monthly_premium": "2500", "employee_share": "800"}))
            .await
            .json::<Value>()["data"]["plan_id"]
            .as_i64()
            .unwrap();
        server
            .post("/api/hmo/enrollments")
            .add_header(&auth.0, &auth.1)
            .json(&json!({"employee_id": employee.id, "plan_id": plan}))
            .await
            .assert_status(StatusCode::CREATED);

        let premiums: Value = server
            .get("/api/integrations/hmo_payroll/premiums")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(premiums["data"][0]["employee_share"], "800.00");

        let first: Value = server
            .post("/api/integrations/hmo_payroll/sync")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(first["data"], json!({"created": 1, "updated": 0, "deactivated": 0}));

        let second: Value = server
            .post("/api/integrations/hmo_payroll/sync")
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(second["data"], json!({"created": 0, "updated": 1, "deactivated": 0}));

        let deductions: Value = server
            .get(&format!("/api/deductions?employee_id={}", employee.id))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(deductions["data"]["pagination"]["total"], 1);
        assert_eq!(deductions["data"]["items"][0]["deduction_type"], "HMO Premium");
        assert_eq!(deductions["data"]["items"][0]["amount"], "800.00");
    }

    #[sqlx::test]
    async fn test_sync_requires_payroll_role(pool: PgPool) {
        let staff = create_test_user(&pool, Role::HrStaff).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&staff);
        server
            .post("/api/integrations/hmo_payroll/sync")
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
