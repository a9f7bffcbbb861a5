//! Database models for salaries, bonuses and deductions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::api::models::salaries::PayFrequency;
use crate::types::{BonusId, DeductionId, EmployeeId, EnrollmentId, SalaryId};

#[derive(Debug, Clone)]
pub struct SalaryCreateDBRequest {
    pub employee_id: EmployeeId,
    pub base_salary: Decimal,
    pub pay_frequency: Option<PayFrequency>,
    pub effective_date: Option<NaiveDate>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SalaryUpdateDBRequest {
    pub base_salary: Option<Decimal>,
    pub pay_frequency: Option<PayFrequency>,
    pub effective_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SalaryDBResponse {
    #[serde(rename = "salary_id")]
    pub id: SalaryId,
    pub employee_id: EmployeeId,
    pub base_salary: Decimal,
    pub pay_frequency: PayFrequency,
    pub effective_date: NaiveDate,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BonusCreateDBRequest {
    pub employee_id: EmployeeId,
    pub bonus_type: String,
    pub amount: Decimal,
    pub award_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BonusUpdateDBRequest {
    pub bonus_type: Option<String>,
    pub amount: Option<Decimal>,
    pub award_date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct BonusDBResponse {
    #[serde(rename = "bonus_id")]
    pub id: BonusId,
    pub employee_id: EmployeeId,
    pub bonus_type: String,
    pub amount: Decimal,
    pub award_date: NaiveDate,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeductionCreateDBRequest {
    pub employee_id: EmployeeId,
    pub deduction_type: String,
    pub amount: Decimal,
    pub is_recurring: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct DeductionUpdateDBRequest {
    pub deduction_type: Option<String>,
    pub amount: Option<Decimal>,
    pub is_recurring: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct DeductionDBResponse {
    #[serde(rename = "deduction_id")]
    pub id: DeductionId,
    pub employee_id: EmployeeId,
    pub deduction_type: String,
    pub amount: Decimal,
    pub is_recurring: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Set on premium deductions maintained by the HMO payroll sync
    pub hmo_enrollment_id: Option<EnrollmentId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
