//! End-to-end tests that walk whole workflows through the full router.

use crate::api::models::users::Role;
use crate::create_initial_admin_user;
use crate::test_utils::{add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_plan(server: &TestServer, auth: &(String, String)) -> i64 {
    let provider = server
        .post("/api/hmo/providers")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"name": "PhilCare"}))
        .await
        .json::<Value>()["data"]["provider_id"]
        .as_i64()
        .unwrap();
    server
        .post("/api/hmo/plans")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"provider_id": provider, "name": "Family", "monthly_premium": "3000", "employee_share": "1000"}))
        .await
        .json::<Value>()["data"]["plan_id"]
        .as_i64()
        .unwrap()
}

async fn enroll(server: &TestServer, auth: &(String, String), employee_id: i64, plan_id: i64) -> i64 {
    let response = server
        .post("/api/hmo/enrollments")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"employee_id": employee_id, "plan_id": plan_id}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "Active");
    body["data"]["enrollment_id"].as_i64().unwrap()
}

/// The configured admin signs in with a password and provisions an HR account
#[sqlx::test]
#[test_log::test]
async fn test_e2e_admin_login_and_provisioning(pool: PgPool) {
    create_initial_admin_user("root@hospital.local", Some("bootstrap-password"), &pool)
        .await
        .unwrap();
    let server = create_test_app(pool);

    let login: Value = server
        .post("/api/auth/login")
        .json(&json!({"email": "root@hospital.local", "password": "bootstrap-password"}))
        .await
        .json();
    assert_eq!(login["data"]["user"]["role"], "System Admin");
    let token = login["data"]["token"].as_str().unwrap().to_string();

    let created = server
        .post("/api/users")
        .authorization_bearer(&token)
        .json(&json!({"email": "hr.head@hospital.local", "password": "hr-head-password", "role": "HR Manager"}))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert!(created.json::<Value>()["data"].get("password_hash").is_none());

    let hr_login = server
        .post("/api/auth/login")
        .json(&json!({"email": "hr.head@hospital.local", "password": "hr-head-password"}))
        .await;
    hr_login.assert_status_ok();
    assert_eq!(hr_login.json::<Value>()["data"]["user"]["role"], "HR Manager");
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_employee_lifecycle(pool: PgPool) {
    let hr = create_test_user(&pool, Role::HrManager).await;
    let department = create_test_department(&pool, "Surgery").await;
    let server = create_test_app(pool);
    let auth = add_auth_headers(&hr);

    let created = server
        .post("/api/employees")
        .add_header(&auth.0, &auth.1)
        .json(&json!({
            "first_name": "Maria",
            "last_name": "Santos",
            "email": "maria.santos@hospital.local",
            "job_title": "Scrub Nurse",
            "department_id": department.id,
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    let employee_id = created["data"]["employee_id"].as_i64().unwrap();

    let fetched: Value = server
        .get(&format!("/api/employees/{employee_id}"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    for field in ["first_name", "last_name", "email", "job_title", "department_id"] {
        assert_eq!(fetched["data"][field], created["data"][field], "{field} differs");
    }

    server
        .patch(&format!("/api/employees/{employee_id}"))
        .add_header(&auth.0, &auth.1)
        .json(&json!({"is_active": 0}))
        .await
        .assert_status_ok();

    let listed: Value = server.get("/api/employees").add_header(&auth.0, &auth.1).await.json();
    let ids: Vec<i64> = listed["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["employee_id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&employee_id));

    // Still reachable by id and through include_inactive
    let fetched: Value = server
        .get(&format!("/api/employees/{employee_id}"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(fetched["data"]["is_active"], false);
    let everyone: Value = server
        .get("/api/employees?include_inactive=true")
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(everyone["data"]["pagination"]["total"], 1);
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_enrollment_termination_is_final(pool: PgPool) {
    let hr = create_test_user(&pool, Role::HrManager).await;
    let department = create_test_department(&pool, "Pediatrics").await;
    let employee = create_test_employee(&pool, "peds@hospital.local", department.id).await;
    let server = create_test_app(pool);
    let auth = add_auth_headers(&hr);

    let plan = create_plan(&server, &auth).await;
    let enrollment = enroll(&server, &auth, employee.id, plan).await;

    server
        .put(&format!("/api/hmo/enrollments/{enrollment}/terminate"))
        .add_header(&auth.0, &auth.1)
        .json(&json!({"end_date": "2030-03-31"}))
        .await
        .assert_status_ok();

    let fetched: Value = server
        .get(&format!("/api/hmo/enrollments/{enrollment}"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(fetched["data"]["status"], "Terminated");
    assert_eq!(fetched["data"]["end_date"], "2030-03-31");

    let again = server
        .put(&format!("/api/hmo/enrollments/{enrollment}/terminate"))
        .add_header(&auth.0, &auth.1)
        .json(&json!({"end_date": "2030-12-31"}))
        .await;
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(again.json::<Value>()["error"], "invalid_transition");

    let unchanged: Value = server
        .get(&format!("/api/hmo/enrollments/{enrollment}"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(unchanged["data"]["end_date"], "2030-03-31");
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_claim_decision_is_final(pool: PgPool) {
    let hr = create_test_user(&pool, Role::HrManager).await;
    let department = create_test_department(&pool, "Cardiology").await;
    let employee = create_test_employee(&pool, "cardio@hospital.local", department.id).await;
    let server = create_test_app(pool);
    let auth = add_auth_headers(&hr);

    let plan = create_plan(&server, &auth).await;
    let enrollment = enroll(&server, &auth, employee.id, plan).await;

    let filed = server
        .post("/api/hmo/claims")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"enrollment_id": enrollment, "amount": 12500}))
        .await;
    filed.assert_status(StatusCode::CREATED);
    let filed: Value = filed.json();
    assert_eq!(filed["data"]["status"], "Pending");
    let claim = filed["data"]["claim_id"].as_i64().unwrap();

    let approved: Value = server
        .put(&format!("/api/hmo/claims/{claim}/approve"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(approved["data"]["status"], "Approved");

    server
        .put(&format!("/api/hmo/claims/{claim}/deny"))
        .add_header(&auth.0, &auth.1)
        .json(&json!({"comment": "Second thoughts"}))
        .await
        .assert_status(StatusCode::CONFLICT);

    let fetched: Value = server
        .get(&format!("/api/hmo/claims/{claim}"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(fetched["data"]["status"], "Approved");
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_manager_approves_claim(pool: PgPool) {
    let hr = create_test_user(&pool, Role::HrManager).await;
    let manager = create_test_user(&pool, Role::Manager).await;
    let department = create_test_department(&pool, "Radiology").await;
    let employee = create_test_employee(&pool, "xray@hospital.local", department.id).await;
    let server = create_test_app(pool);
    let hr_auth = add_auth_headers(&hr);
    let auth = add_auth_headers(&manager);

    let plan = create_plan(&server, &hr_auth).await;
    let enrollment = enroll(&server, &hr_auth, employee.id, plan).await;
    let claim = server
        .post("/api/hmo/claims")
        .add_header(&hr_auth.0, &hr_auth.1)
        .json(&json!({"enrollment_id": enrollment, "amount": "8000.50"}))
        .await
        .json::<Value>()["data"]["claim_id"]
        .as_i64()
        .unwrap();

    let approved = server
        .put(&format!("/api/hmo/claims/{claim}/approve"))
        .add_header(&auth.0, &auth.1)
        .json(&json!({"comment": "Within plan limits"}))
        .await;
    approved.assert_status_ok();
    assert_eq!(approved.json::<Value>()["data"]["status"], "Approved");

    let denied = server
        .put(&format!("/api/hmo/claims/{claim}/deny"))
        .add_header(&auth.0, &auth.1)
        .await;
    denied.assert_status(StatusCode::CONFLICT);
    assert_eq!(denied.json::<Value>()["error"], "invalid_transition");
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_payroll_with_hmo_premiums(pool: PgPool) {
    let hr = create_test_user(&pool, Role::HrManager).await;
    let officer = create_test_user(&pool, Role::PayrollOfficer).await;
    let department = create_test_department(&pool, "Neurology").await;
    let employee = create_test_employee(&pool, "neuro@hospital.local", department.id).await;
    let server = create_test_app(pool);
    let hr_auth = add_auth_headers(&hr);
    let auth = add_auth_headers(&officer);

    let plan = create_plan(&server, &hr_auth).await;
    enroll(&server, &hr_auth, employee.id, plan).await;
    server
        .post("/api/integrations/hmo_payroll/sync")
        .add_header(&auth.0, &auth.1)
        .await
        .assert_status_ok();

    server
        .post("/api/salaries")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"employee_id": employee.id, "base_salary": "40000", "pay_frequency": "monthly", "effective_date": "2020-01-01"}))
        .await
        .assert_status(StatusCode::CREATED);

    let run = server
        .post("/api/payroll/runs")
        .add_header(&auth.0, &auth.1)
        .json(&json!({"period_start": "2030-01-01", "period_end": "2030-01-31", "pay_date": "2030-02-05"}))
        .await
        .json::<Value>()["data"]["run_id"]
        .as_i64()
        .unwrap();

    let processed: Value = server
        .put(&format!("/api/payroll/runs/{run}/process"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(processed["data"]["payslips_generated"], 1);
    assert_eq!(processed["data"]["run"]["total_gross"], "40000.00");
    assert_eq!(processed["data"]["run"]["total_deductions"], "1000.00");
    assert_eq!(processed["data"]["run"]["total_net"], "39000.00");

    let completed: Value = server
        .put(&format!("/api/payroll/runs/{run}/complete"))
        .add_header(&auth.0, &auth.1)
        .await
        .json();
    assert_eq!(completed["data"]["status"], "Completed");

    // A completed run is terminal
    server
        .put(&format!("/api/payroll/runs/{run}/cancel"))
        .add_header(&auth.0, &auth.1)
        .await
        .assert_status(StatusCode::CONFLICT);

    let dashboard: Value = server.get("/api/dashboard").add_header(&auth.0, &auth.1).await.json();
    assert_eq!(dashboard["data"]["last_completed_run"]["run_id"], run);
}
