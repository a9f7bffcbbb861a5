//! Database models for employees.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::api::models::employees::EmploymentType;
use crate::types::{BranchId, DepartmentId, EmployeeId, PositionId};

/// Database request for creating an employee
#[derive(Debug, Clone)]
pub struct EmployeeCreateDBRequest {
    /// Generated as `EMP-000042` from the row id when absent
    pub employee_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: String,
    pub department_id: DepartmentId,
    pub branch_id: Option<BranchId>,
    pub position_id: Option<PositionId>,
    pub manager_id: Option<EmployeeId>,
    pub hire_date: Option<NaiveDate>,
    pub employment_type: Option<EmploymentType>,
}

/// Database request for updating an employee. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdateDBRequest {
    pub employee_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub job_title: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub branch_id: Option<Option<BranchId>>,
    pub position_id: Option<Option<PositionId>>,
    pub manager_id: Option<Option<EmployeeId>>,
    pub hire_date: Option<NaiveDate>,
    pub employment_type: Option<EmploymentType>,
    pub is_active: Option<bool>,
}

/// An employee row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct EmployeeDBResponse {
    #[serde(rename = "employee_id")]
    pub id: EmployeeId,
    pub employee_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: String,
    pub department_id: DepartmentId,
    pub branch_id: Option<BranchId>,
    pub position_id: Option<PositionId>,
    pub manager_id: Option<EmployeeId>,
    pub hire_date: NaiveDate,
    pub employment_type: EmploymentType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
