//! Database models for compensation planning: salary grades, pay bands, grade mappings,
//! pay adjustment requests and grade revisions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::lifecycle::ApprovalStatus;
use crate::types::{EmployeeId, GradeMappingId, GradeRevisionId, PayAdjustmentId, PayBandId, SalaryGradeId, UserId};

#[derive(Debug, Clone)]
pub struct SalaryGradeCreateDBRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SalaryGradeUpdateDBRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SalaryGradeDBResponse {
    #[serde(rename = "grade_id")]
    pub id: SalaryGradeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PayBandCreateDBRequest {
    pub grade_id: SalaryGradeId,
    pub min_salary: Decimal,
    pub mid_salary: Decimal,
    pub max_salary: Decimal,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct PayBandUpdateDBRequest {
    pub min_salary: Option<Decimal>,
    pub mid_salary: Option<Decimal>,
    pub max_salary: Option<Decimal>,
    pub effective_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PayBandDBResponse {
    #[serde(rename = "band_id")]
    pub id: PayBandId,
    pub grade_id: SalaryGradeId,
    pub min_salary: Decimal,
    pub mid_salary: Decimal,
    pub max_salary: Decimal,
    pub effective_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GradeMappingCreateDBRequest {
    pub employee_id: EmployeeId,
    pub grade_id: SalaryGradeId,
    pub step: Option<i32>,
    pub effective_date: Option<NaiveDate>,
    pub is_current: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GradeMappingDBResponse {
    #[serde(rename = "mapping_id")]
    pub id: GradeMappingId,
    pub employee_id: EmployeeId,
    pub grade_id: SalaryGradeId,
    pub step: i32,
    pub effective_date: NaiveDate,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PayAdjustmentCreateDBRequest {
    pub employee_id: EmployeeId,
    pub proposed_salary: Decimal,
    pub adjustment_type: String,
    pub reason: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub requested_by: UserId,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PayAdjustmentDBResponse {
    #[serde(rename = "adjustment_id")]
    pub id: PayAdjustmentId,
    pub employee_id: EmployeeId,
    /// Base salary current when the request was filed
    pub current_salary: Option<Decimal>,
    pub proposed_salary: Decimal,
    pub adjustment_type: String,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub status: ApprovalStatus,
    pub requested_by: Option<UserId>,
    pub status_changed_by: Option<UserId>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GradeRevisionCreateDBRequest {
    pub grade_id: SalaryGradeId,
    pub proposed_min_salary: Decimal,
    pub proposed_mid_salary: Decimal,
    pub proposed_max_salary: Decimal,
    pub reason: Option<String>,
    pub requested_by: UserId,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GradeRevisionDBResponse {
    #[serde(rename = "revision_id")]
    pub id: GradeRevisionId,
    pub grade_id: SalaryGradeId,
    pub proposed_min_salary: Decimal,
    pub proposed_mid_salary: Decimal,
    pub proposed_max_salary: Decimal,
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    pub requested_by: Option<UserId>,
    pub status_changed_by: Option<UserId>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
