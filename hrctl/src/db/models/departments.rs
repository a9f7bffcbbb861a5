//! Database models for departments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{BranchId, DepartmentId, EmployeeId};

#[derive(Debug, Clone)]
pub struct DepartmentCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<EmployeeId>,
    pub branch_id: Option<BranchId>,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct DepartmentUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub manager_id: Option<Option<EmployeeId>>,
    pub branch_id: Option<Option<BranchId>>,
    pub budget: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct DepartmentDBResponse {
    #[serde(rename = "department_id")]
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<EmployeeId>,
    pub branch_id: Option<BranchId>,
    pub budget: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
