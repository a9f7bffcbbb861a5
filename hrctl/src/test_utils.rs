//! Fixtures shared by the unit, repository and end-to-end tests.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::{password, session},
    config::{Config, DocumentsConfig, EmailConfig, LogFormat, PoolSettings},
    db::{
        handlers::{Departments, Employees, Repository, Users},
        models::{
            departments::{DepartmentCreateDBRequest, DepartmentDBResponse},
            employees::{EmployeeCreateDBRequest, EmployeeDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    storage::LocalDiskStorage,
    types::EmployeeId,
};

/// Password given to every fixture user
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn create_test_config() -> Config {
    // Each config gets its own scratch directories so parallel tests never share files
    let scratch = std::env::temp_dir().join(format!("hrctl-test-{}", Uuid::new_v4().simple()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        app_url: "http://localhost:3001".to_string(),
        database_url: None,
        database: crate::config::DatabaseConfig {
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
            ..Default::default()
        },
        admin_email: "admin@test.local".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig::default(),
        email: EmailConfig {
            smtp: None,
            file_path: scratch.join("emails").to_string_lossy().to_string(),
            ..Default::default()
        },
        documents: DocumentsConfig {
            storage_dir: scratch.join("documents"),
            max_upload_bytes: 1024 * 1024,
            ..Default::default()
        },
        enable_metrics: false,
        log_format: LogFormat::Pretty,
    }
}

pub fn create_test_app_state(pool: PgPool) -> AppState {
    let config = create_test_config();
    let storage = Arc::new(LocalDiskStorage::new(config.documents.storage_dir.clone()));

    AppState::builder().db(pool).config(config).storage(storage).build()
}

/// The full router over `pool`, served in memory
pub fn create_test_app(pool: PgPool) -> TestServer {
    let state = create_test_app_state(pool);
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// An active account with [`TEST_PASSWORD`], not linked to an employee
pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    insert_user(pool, role, None).await
}

/// An active account linked to `employee_id`, for the own-record paths
pub async fn create_test_user_for_employee(pool: &PgPool, role: Role, employee_id: EmployeeId) -> UserDBResponse {
    insert_user(pool, role, Some(employee_id)).await
}

async fn insert_user(pool: &PgPool, role: Role, employee_id: Option<EmployeeId>) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let password_hash = password::hash_string(TEST_PASSWORD).expect("Failed to hash test password");

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("user-{}@hospital.local", Uuid::new_v4().simple()),
            password_hash: Some(password_hash),
            role,
            employee_id,
            two_factor_enabled: false,
        })
        .await
        .expect("Failed to create test user")
}

/// Header name and value carrying a session token for `user`
pub fn add_auth_headers(user: &UserDBResponse) -> (String, String) {
    let config = create_test_config();
    let (token, _) = session::create_session_token(&CurrentUser::from(user), &config).expect("Failed to sign session token");
    ("authorization".to_string(), format!("Bearer {token}"))
}

pub async fn create_test_department(pool: &PgPool, name: &str) -> DepartmentDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Departments::new(&mut conn)
        .create(&DepartmentCreateDBRequest {
            name: name.to_string(),
            description: None,
            manager_id: None,
            branch_id: None,
            budget: None,
        })
        .await
        .expect("Failed to create test department")
}

/// A full-time employee hired today
pub fn employee_request(email: &str, department_id: i64) -> EmployeeCreateDBRequest {
    EmployeeCreateDBRequest {
        employee_number: None,
        first_name: "Test".to_string(),
        last_name: "Employee".to_string(),
        email: email.to_string(),
        phone: None,
        job_title: "Staff Nurse".to_string(),
        department_id,
        branch_id: None,
        position_id: None,
        manager_id: None,
        hire_date: None,
        employment_type: None,
    }
}

pub async fn create_test_employee(pool: &PgPool, email: &str, department_id: i64) -> EmployeeDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Employees::new(&mut conn)
        .create(&employee_request(email, department_id))
        .await
        .expect("Failed to create test employee")
}
