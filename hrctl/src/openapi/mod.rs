//! OpenAPI documentation for the `/api` surface.
//!
//! [`ApiDoc`] collects every handler's `#[utoipa::path]` annotation. Schemas referenced by a
//! path are registered automatically. The document is served at `/api/openapi.json` and
//! rendered by Scalar at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Session token schemes: the bearer header and the session cookie.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `POST /auth/login` (or `/auth/verify-2fa` when two-factor \
                            sign in is enabled):\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "hrctl_session",
                    "The same session token, set as a cookie by the login endpoints",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "hrctl",
        description = "Hospital HR and payroll administration API. Every response is wrapped in \
            `{success, message, data}` on success or `{success, message, error}` on failure."
    ),
    servers(
        (url = "/api", description = "HR administration API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::verify_two_factor,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::auth::change_password,
        api::handlers::auth::request_password_reset,
        api::handlers::auth::confirm_password_reset,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::employees::list_employees,
        api::handlers::employees::create_employee,
        api::handlers::employees::get_employee,
        api::handlers::employees::update_employee,
        api::handlers::employees::delete_employee,
        api::handlers::employees::list_employee_benefits,
        api::handlers::employees::list_employee_payslips,
        api::handlers::departments::list_departments,
        api::handlers::departments::create_department,
        api::handlers::departments::get_department,
        api::handlers::departments::update_department,
        api::handlers::departments::delete_department,
        api::handlers::departments::list_department_employees,
        api::handlers::branches::list_branches,
        api::handlers::branches::create_branch,
        api::handlers::branches::get_branch,
        api::handlers::branches::update_branch,
        api::handlers::branches::delete_branch,
        api::handlers::positions::list_positions,
        api::handlers::positions::create_position,
        api::handlers::positions::get_position,
        api::handlers::positions::update_position,
        api::handlers::positions::delete_position,
        api::handlers::benefits::list_categories,
        api::handlers::benefits::create_category,
        api::handlers::benefits::get_category,
        api::handlers::benefits::update_category,
        api::handlers::benefits::delete_category,
        api::handlers::benefits::list_benefits,
        api::handlers::benefits::create_benefit,
        api::handlers::benefits::get_benefit,
        api::handlers::benefits::update_benefit,
        api::handlers::benefits::delete_benefit,
        api::handlers::benefits::assign_benefit,
        api::handlers::benefits::end_assignment,
        api::handlers::salaries::list_salaries,
        api::handlers::salaries::create_salary,
        api::handlers::salaries::get_salary,
        api::handlers::salaries::update_salary,
        api::handlers::salaries::delete_salary,
        api::handlers::salaries::list_bonuses,
        api::handlers::salaries::create_bonus,
        api::handlers::salaries::get_bonus,
        api::handlers::salaries::update_bonus,
        api::handlers::salaries::delete_bonus,
        api::handlers::salaries::list_deductions,
        api::handlers::salaries::create_deduction,
        api::handlers::salaries::get_deduction,
        api::handlers::salaries::update_deduction,
        api::handlers::salaries::delete_deduction,
        api::handlers::payroll::list_runs,
        api::handlers::payroll::create_run,
        api::handlers::payroll::get_run,
        api::handlers::payroll::update_run,
        api::handlers::payroll::delete_run,
        api::handlers::payroll::process_run,
        api::handlers::payroll::complete_run,
        api::handlers::payroll::cancel_run,
        api::handlers::payroll::list_run_payslips,
        api::handlers::payroll::list_payslips,
        api::handlers::payroll::get_payslip,
        api::handlers::hmo::list_providers,
        api::handlers::hmo::create_provider,
        api::handlers::hmo::get_provider,
        api::handlers::hmo::update_provider,
        api::handlers::hmo::delete_provider,
        api::handlers::hmo::list_plans,
        api::handlers::hmo::create_plan,
        api::handlers::hmo::get_plan,
        api::handlers::hmo::update_plan,
        api::handlers::hmo::delete_plan,
        api::handlers::hmo::list_enrollments,
        api::handlers::hmo::create_enrollment,
        api::handlers::hmo::get_enrollment,
        api::handlers::hmo::terminate_enrollment,
        api::handlers::hmo::list_claims,
        api::handlers::hmo::create_claim,
        api::handlers::hmo::get_claim,
        api::handlers::hmo::review_claim,
        api::handlers::hmo::approve_claim,
        api::handlers::hmo::deny_claim,
        api::handlers::integrations::list_premiums,
        api::handlers::integrations::sync_premiums,
        api::handlers::compensation::list_grades,
        api::handlers::compensation::create_grade,
        api::handlers::compensation::get_grade,
        api::handlers::compensation::update_grade,
        api::handlers::compensation::delete_grade,
        api::handlers::compensation::list_pay_bands,
        api::handlers::compensation::create_pay_band,
        api::handlers::compensation::get_pay_band,
        api::handlers::compensation::update_pay_band,
        api::handlers::compensation::delete_pay_band,
        api::handlers::compensation::list_grade_mappings,
        api::handlers::compensation::create_grade_mapping,
        api::handlers::compensation::get_grade_mapping,
        api::handlers::compensation::delete_grade_mapping,
        api::handlers::compensation::list_pay_adjustments,
        api::handlers::compensation::create_pay_adjustment,
        api::handlers::compensation::get_pay_adjustment,
        api::handlers::compensation::approve_pay_adjustment,
        api::handlers::compensation::deny_pay_adjustment,
        api::handlers::compensation::list_grade_revisions,
        api::handlers::compensation::create_grade_revision,
        api::handlers::compensation::get_grade_revision,
        api::handlers::compensation::approve_grade_revision,
        api::handlers::compensation::deny_grade_revision,
        api::handlers::documents::upload_document,
        api::handlers::documents::list_employee_documents,
        api::handlers::documents::get_document,
        api::handlers::documents::download_document,
        api::handlers::documents::delete_document,
        api::handlers::documents::share_document,
        api::handlers::documents::download_shared_document,
        api::handlers::analytics::list_metrics,
        api::handlers::analytics::get_metric,
        api::handlers::analytics::list_cache,
        api::handlers::analytics::invalidate_cache,
        api::handlers::reports::headcount_report,
        api::handlers::reports::payroll_summary_report,
        api::handlers::reports::benefits_report,
        api::handlers::reports::hmo_claims_report,
        api::handlers::reports::dashboard,
    ),
    tags(
        (name = "auth", description = "Sign in, two-factor verification and password management"),
        (name = "users", description = "User accounts and roles"),
        (name = "employees", description = "Employee directory"),
        (name = "departments", description = "Departments"),
        (name = "branches", description = "Hospital branches"),
        (name = "positions", description = "Positions within departments"),
        (name = "salaries", description = "Base salaries"),
        (name = "bonuses", description = "One-off bonuses"),
        (name = "deductions", description = "Recurring and one-off deductions"),
        (name = "payroll", description = "Payroll runs and payslips"),
        (name = "benefits", description = "Benefits catalog and assignments"),
        (name = "hmo", description = "HMO providers, plans, enrollments and claims"),
        (name = "integrations", description = "HMO premiums in payroll"),
        (name = "compensation planning", description = "Salary grades, pay bands and approval workflows"),
        (name = "documents", description = "Employee documents and share links"),
        (name = "hr analytics", description = "Cached HR metrics"),
        (name = "reports", description = "Reports and the dashboard"),
    )
)]
pub struct ApiDoc;
