//! # hrctl: Hospital HR and Payroll Administration
//!
//! `hrctl` is the back end for a hospital's human resources office. It keeps the employee
//! directory and organization structure, pays people through salaries, bonuses, deductions
//! and payroll runs, manages benefits and HMO health plans with their claims, plans
//! compensation through salary grades and pay bands, stores employee documents, and
//! answers questions through analytics metrics, reports and a dashboard.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence. Everything is served as JSON under `/api`, wrapped in
//! a uniform envelope:
//!
//! ```text
//! { "success": true,  "message": "...", "data": ... }
//! { "success": false, "message": "...", "error": "not_found" | { "field": "reason" } }
//! ```
//!
//! ### Request Flow
//!
//! A request passes the tracing and CORS layers, is routed to a handler in
//! [`api::handlers`], and is authenticated by the `CurrentUser` extractor, which reads a
//! session JWT from the `Authorization` header or the session cookie and reloads the account.
//! Handlers then check the caller's role against the policy table in
//! [`auth::permissions`], usually through the `RequiresPermission` extractor, before touching
//! the database through the repositories in [`db::handlers`].
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds handlers, request/response models and extractors whose
//! rejections already speak the envelope.
//!
//! The **authentication layer** ([`auth`]) covers password hashing, email-delivered two-factor
//! codes, session tokens and role-based permissions.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Repositories borrow a
//! connection so multi-step workflows such as processing a payroll run or approving a pay
//! adjustment run in one transaction.
//!
//! Status-driven entities (payroll runs, enrollments, claims, approval requests) move through
//! the explicit transition tables in [`lifecycle`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use hrctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = hrctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     hrctl::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! hrctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
mod crypto;
pub mod db;
mod email;
pub mod errors;
pub mod lifecycle;
mod openapi;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::{
    api::models::users::Role,
    auth::password,
    cache::MetricsCache,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    openapi::ApiDoc,
    storage::{DocumentStorage, LocalDiskStorage},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Uri, header},
    routing::{delete, get, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::UserId;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `metrics_cache`: Computed analytics metrics, keyed by metric name and parameters
/// - `storage`: Where uploaded employee documents live
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .storage(Arc::new(LocalDiskStorage::new("./storage/documents")))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    #[builder(default)]
    pub metrics_cache: MetricsCache,
    pub storage: Arc<dyn DocumentStorage>,
}

/// Get the hrctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial System Admin user if it doesn't exist.
///
/// Idempotent: an existing account with the configured email keeps its id and only has its
/// password replaced when one is configured. Called on every startup.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> Result<UserId, Error> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string_blocking(pwd.to_string()).await?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            user_repo.set_password_hash(existing_user.id, &password_hash).await?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash,
            role: Role::SystemAdmin,
            employee_id: None,
            two_factor_enabled: false,
        })
        .await?;

    tx.commit().await?;
    info!(user_id = created_user.id, "Created initial admin user");
    Ok(created_user.id)
}

/// Connect the pool, run migrations and make sure the admin account exists
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config.database.connection_url()?;
    let pool_settings = &config.database.pool;

    let pool = PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(pool_settings.acquire_timeout)
        .connect(&database_url)
        .await?;
    migrator().run(&pool).await?;

    create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![header::CONTENT_DISPOSITION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn route_not_found(uri: Uri) -> Error {
    Error::not_found("Route", uri.path())
}

async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - The JSON API under `/api`, with `PUT` accepted wherever `PATCH` updates a record
/// - Envelope responses for unknown routes (404) and unsupported methods (405)
/// - The OpenAPI document and its Scalar UI
/// - Optional Prometheus metrics
/// - CORS configuration
/// - Tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Multipart framing needs some room above the file itself
    let upload_limit = state.config.documents.max_upload_bytes.saturating_add(64 * 1024);

    let api_routes = Router::new()
        // Authentication
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/verify-2fa", post(api::handlers::auth::verify_two_factor))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route("/auth/me", get(api::handlers::auth::me))
        .route("/auth/password", put(api::handlers::auth::change_password))
        .route("/auth/password-resets", post(api::handlers::auth::request_password_reset))
        .route(
            "/auth/password-resets/{token_id}/confirm",
            post(api::handlers::auth::confirm_password_reset),
        )
        // User management
        .route("/users", get(api::handlers::users::list_users).post(api::handlers::users::create_user))
        .route(
            "/users/{id}",
            get(api::handlers::users::get_user)
                .patch(api::handlers::users::update_user)
                .put(api::handlers::users::update_user)
                .delete(api::handlers::users::delete_user),
        )
        // Employees and their sub-resources
        .route(
            "/employees",
            get(api::handlers::employees::list_employees).post(api::handlers::employees::create_employee),
        )
        .route(
            "/employees/{id}",
            get(api::handlers::employees::get_employee)
                .patch(api::handlers::employees::update_employee)
                .put(api::handlers::employees::update_employee)
                .delete(api::handlers::employees::delete_employee),
        )
        .route("/employees/{id}/benefits", get(api::handlers::employees::list_employee_benefits))
        .route("/employees/{id}/payslips", get(api::handlers::employees::list_employee_payslips))
        .route(
            "/employees/{id}/documents",
            get(api::handlers::documents::list_employee_documents)
                .post(api::handlers::documents::upload_document)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Organization
        .route(
            "/departments",
            get(api::handlers::departments::list_departments).post(api::handlers::departments::create_department),
        )
        .route(
            "/departments/{id}",
            get(api::handlers::departments::get_department)
                .patch(api::handlers::departments::update_department)
                .put(api::handlers::departments::update_department)
                .delete(api::handlers::departments::delete_department),
        )
        .route(
            "/departments/{id}/employees",
            get(api::handlers::departments::list_department_employees),
        )
        .route(
            "/branches",
            get(api::handlers::branches::list_branches).post(api::handlers::branches::create_branch),
        )
        .route(
            "/branches/{id}",
            get(api::handlers::branches::get_branch)
                .patch(api::handlers::branches::update_branch)
                .put(api::handlers::branches::update_branch)
                .delete(api::handlers::branches::delete_branch),
        )
        .route(
            "/positions",
            get(api::handlers::positions::list_positions).post(api::handlers::positions::create_position),
        )
        .route(
            "/positions/{id}",
            get(api::handlers::positions::get_position)
                .patch(api::handlers::positions::update_position)
                .put(api::handlers::positions::update_position)
                .delete(api::handlers::positions::delete_position),
        )
        // Benefits catalog and assignments
        .route(
            "/benefits/categories",
            get(api::handlers::benefits::list_categories).post(api::handlers::benefits::create_category),
        )
        .route(
            "/benefits/categories/{id}",
            get(api::handlers::benefits::get_category)
                .patch(api::handlers::benefits::update_category)
                .put(api::handlers::benefits::update_category)
                .delete(api::handlers::benefits::delete_category),
        )
        .route(
            "/benefits",
            get(api::handlers::benefits::list_benefits).post(api::handlers::benefits::create_benefit),
        )
        .route(
            "/benefits/{id}",
            get(api::handlers::benefits::get_benefit)
                .patch(api::handlers::benefits::update_benefit)
                .put(api::handlers::benefits::update_benefit)
                .delete(api::handlers::benefits::delete_benefit),
        )
        .route("/benefits/{id}/assignments", post(api::handlers::benefits::assign_benefit))
        .route("/benefits/assignments/{id}", delete(api::handlers::benefits::end_assignment))
        // Salaries, bonuses and deductions
        .route(
            "/salaries",
            get(api::handlers::salaries::list_salaries).post(api::handlers::salaries::create_salary),
        )
        .route(
            "/salaries/{id}",
            get(api::handlers::salaries::get_salary)
                .patch(api::handlers::salaries::update_salary)
                .put(api::handlers::salaries::update_salary)
                .delete(api::handlers::salaries::delete_salary),
        )
        .route(
            "/bonuses",
            get(api::handlers::salaries::list_bonuses).post(api::handlers::salaries::create_bonus),
        )
        .route(
            "/bonuses/{id}",
            get(api::handlers::salaries::get_bonus)
                .patch(api::handlers::salaries::update_bonus)
                .put(api::handlers::salaries::update_bonus)
                .delete(api::handlers::salaries::delete_bonus),
        )
        .route(
            "/deductions",
            get(api::handlers::salaries::list_deductions).post(api::handlers::salaries::create_deduction),
        )
        .route(
            "/deductions/{id}",
            get(api::handlers::salaries::get_deduction)
                .patch(api::handlers::salaries::update_deduction)
                .put(api::handlers::salaries::update_deduction)
                .delete(api::handlers::salaries::delete_deduction),
        )
        // Payroll
        .route(
            "/payroll/runs",
            get(api::handlers::payroll::list_runs).post(api::handlers::payroll::create_run),
        )
        .route(
            "/payroll/runs/{id}",
            get(api::handlers::payroll::get_run)
                .patch(api::handlers::payroll::update_run)
                .put(api::handlers::payroll::update_run)
                .delete(api::handlers::payroll::delete_run),
        )
        .route("/payroll/runs/{id}/process", put(api::handlers::payroll::process_run))
        .route("/payroll/runs/{id}/complete", put(api::handlers::payroll::complete_run))
        .route("/payroll/runs/{id}/cancel", put(api::handlers::payroll::cancel_run))
        .route("/payroll/runs/{id}/payslips", get(api::handlers::payroll::list_run_payslips))
        .route("/payroll/payslips", get(api::handlers::payroll::list_payslips))
        .route("/payroll/payslips/{id}", get(api::handlers::payroll::get_payslip))
        // HMO
        .route(
            "/hmo/providers",
            get(api::handlers::hmo::list_providers).post(api::handlers::hmo::create_provider),
        )
        .route(
            "/hmo/providers/{id}",
            get(api::handlers::hmo::get_provider)
                .patch(api::handlers::hmo::update_provider)
                .put(api::handlers::hmo::update_provider)
                .delete(api::handlers::hmo::delete_provider),
        )
        .route("/hmo/plans", get(api::handlers::hmo::list_plans).post(api::handlers::hmo::create_plan))
        .route(
            "/hmo/plans/{id}",
            get(api::handlers::hmo::get_plan)
                .patch(api::handlers::hmo::update_plan)
                .put(api::handlers::hmo::update_plan)
                .delete(api::handlers::hmo::delete_plan),
        )
        .route(
            "/hmo/enrollments",
            get(api::handlers::hmo::list_enrollments).post(api::handlers::hmo::create_enrollment),
        )
        .route("/hmo/enrollments/{id}", get(api::handlers::hmo::get_enrollment))
        .route("/hmo/enrollments/{id}/terminate", put(api::handlers::hmo::terminate_enrollment))
        .route("/hmo/claims", get(api::handlers::hmo::list_claims).post(api::handlers::hmo::create_claim))
        .route("/hmo/claims/{id}", get(api::handlers::hmo::get_claim))
        .route("/hmo/claims/{id}/review", put(api::handlers::hmo::review_claim))
        .route("/hmo/claims/{id}/approve", put(api::handlers::hmo::approve_claim))
        .route("/hmo/claims/{id}/deny", put(api::handlers::hmo::deny_claim))
        .route("/integrations/hmo_payroll/premiums", get(api::handlers::integrations::list_premiums))
        .route("/integrations/hmo_payroll/sync", post(api::handlers::integrations::sync_premiums))
        // Compensation planning
        .route(
            "/compensation_planning/salary_grades",
            get(api::handlers::compensation::list_grades).post(api::handlers::compensation::create_grade),
        )
        .route(
            "/compensation_planning/salary_grades/{id}",
            get(api::handlers::compensation::get_grade)
                .patch(api::handlers::compensation::update_grade)
                .put(api::handlers::compensation::update_grade)
                .delete(api::handlers::compensation::delete_grade),
        )
        .route(
            "/compensation_planning/pay_bands",
            get(api::handlers::compensation::list_pay_bands).post(api::handlers::compensation::create_pay_band),
        )
        .route(
            "/compensation_planning/pay_bands/{id}",
            get(api::handlers::compensation::get_pay_band)
                .patch(api::handlers::compensation::update_pay_band)
                .put(api::handlers::compensation::update_pay_band)
                .delete(api::handlers::compensation::delete_pay_band),
        )
        .route(
            "/compensation_planning/grade_mappings",
            get(api::handlers::compensation::list_grade_mappings).post(api::handlers::compensation::create_grade_mapping),
        )
        .route(
            "/compensation_planning/grade_mappings/{id}",
            get(api::handlers::compensation::get_grade_mapping).delete(api::handlers::compensation::delete_grade_mapping),
        )
        .route(
            "/compensation_planning/pay_adjustments",
            get(api::handlers::compensation::list_pay_adjustments).post(api::handlers::compensation::create_pay_adjustment),
        )
        .route(
            "/compensation_planning/pay_adjustments/{id}",
            get(api::handlers::compensation::get_pay_adjustment),
        )
        .route(
            "/compensation_planning/pay_adjustments/{id}/approve",
            put(api::handlers::compensation::approve_pay_adjustment),
        )
        .route(
            "/compensation_planning/pay_adjustments/{id}/deny",
            put(api::handlers::compensation::deny_pay_adjustment),
        )
        .route(
            "/compensation_planning/grade_revisions",
            get(api::handlers::compensation::list_grade_revisions).post(api::handlers::compensation::create_grade_revision),
        )
        .route(
            "/compensation_planning/grade_revisions/{id}",
            get(api::handlers::compensation::get_grade_revision),
        )
        .route(
            "/compensation_planning/grade_revisions/{id}/approve",
            put(api::handlers::compensation::approve_grade_revision),
        )
        .route(
            "/compensation_planning/grade_revisions/{id}/deny",
            put(api::handlers::compensation::deny_grade_revision),
        )
        // Documents
        .route(
            "/documents/{id}",
            get(api::handlers::documents::get_document).delete(api::handlers::documents::delete_document),
        )
        .route("/documents/{id}/download", get(api::handlers::documents::download_document))
        .route("/documents/{id}/share", post(api::handlers::documents::share_document))
        .route("/documents/shared/{token}", get(api::handlers::documents::download_shared_document))
        // Analytics, reports and dashboard
        .route("/hr_analytics/metrics", get(api::handlers::analytics::list_metrics))
        .route("/hr_analytics/metrics/{name}", get(api::handlers::analytics::get_metric))
        .route(
            "/hr_analytics/cache",
            get(api::handlers::analytics::list_cache).delete(api::handlers::analytics::invalidate_cache),
        )
        .route("/reports/headcount", get(api::handlers::reports::headcount_report))
        .route("/reports/payroll_summary", get(api::handlers::reports::payroll_summary_report))
        .route("/reports/benefits", get(api::handlers::reports::benefits_report))
        .route("/reports/hmo_claims", get(api::handlers::reports::hmo_claims_report))
        .route("/dashboard", get(api::handlers::reports::dashboard))
        // Documentation
        .route("/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .fallback(route_not_found);

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A configured server: pool, state and router, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting hrctl with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        tokio::fs::create_dir_all(&config.documents.storage_dir).await?;
        let storage: Arc<dyn DocumentStorage> = Arc::new(LocalDiskStorage::new(config.documents.storage_dir.clone()));

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .storage(storage)
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "hrctl listening on http://{}, public URL {}",
            bind_addr, self.config.app_url
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::create_initial_admin_user;
    use crate::{
        api::models::users::Role,
        db::handlers::{Repository, Users},
        test_utils::{create_test_app, create_test_config},
    };
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_initial_admin_user_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("root@hospital.local", Some("first-password"), &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("root@hospital.local", Some("second-password"), &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_id(first).await.unwrap().unwrap();
        assert_eq!(user.role, Role::SystemAdmin);
        let hash = user.password_hash.unwrap();
        assert!(crate::auth::password::verify_string("second-password", &hash).unwrap());
    }

    #[sqlx::test]
    async fn test_healthz(pool: PgPool) {
        let server = create_test_app(pool);
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[sqlx::test]
    async fn test_unknown_route_uses_envelope(pool: PgPool) {
        let server = create_test_app(pool);
        let response = server.get("/api/no-such-thing").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "not_found");
    }

    #[sqlx::test]
    async fn test_wrong_method_uses_envelope(pool: PgPool) {
        let server = create_test_app(pool);
        let response = server.delete("/api/auth/login").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "method_not_allowed");
    }

    #[sqlx::test]
    async fn test_openapi_document_is_served(pool: PgPool) {
        let server = create_test_app(pool);
        let body: Value = server.get("/api/openapi.json").await.json();
        assert!(body["paths"]["/employees"].is_object());
        assert!(body["components"]["securitySchemes"]["BearerAuth"].is_object());
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        let mut config = create_test_config();
        config.auth.cors.allowed_origins = vec!["not a header\n".to_string()];
        assert!(super::create_cors_layer(&config).is_err());
    }
}
