//! Database models for benefit categories, benefits and employee benefit assignments.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{BenefitAssignmentId, BenefitCategoryId, BenefitId, EmployeeId};

#[derive(Debug, Clone)]
pub struct BenefitCategoryCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BenefitCategoryUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct BenefitCategoryDBResponse {
    #[serde(rename = "category_id")]
    pub id: BenefitCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BenefitCreateDBRequest {
    pub category_id: BenefitCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct BenefitUpdateDBRequest {
    pub category_id: Option<BenefitCategoryId>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub value: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct BenefitDBResponse {
    #[serde(rename = "benefit_id")]
    pub id: BenefitId,
    pub category_id: BenefitCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub value: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BenefitAssignmentCreateDBRequest {
    pub employee_id: EmployeeId,
    pub benefit_id: BenefitId,
    pub start_date: Option<NaiveDate>,
}

/// A benefit held by an employee. Ending an assignment stamps `end_date` and deactivates it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct BenefitAssignmentDBResponse {
    #[serde(rename = "assignment_id")]
    pub id: BenefitAssignmentId,
    pub employee_id: EmployeeId,
    pub benefit_id: BenefitId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An assignment joined with its benefit, as listed on an employee's profile
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct EmployeeBenefitDBResponse {
    pub assignment_id: BenefitAssignmentId,
    pub benefit_id: BenefitId,
    pub benefit_name: String,
    pub category_name: String,
    pub value: Option<Decimal>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}
