//! Database models for HMO providers, plans, enrollments and claims.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::lifecycle::{ClaimStatus, EnrollmentStatus};
use crate::types::{ClaimId, EmployeeId, EnrollmentId, HmoPlanId, HmoProviderId, UserId};

#[derive(Debug, Clone)]
pub struct HmoProviderCreateDBRequest {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HmoProviderUpdateDBRequest {
    pub name: Option<String>,
    pub contact_person: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct HmoProviderDBResponse {
    #[serde(rename = "provider_id")]
    pub id: HmoProviderId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HmoPlanCreateDBRequest {
    pub provider_id: HmoProviderId,
    pub name: String,
    pub coverage: Option<String>,
    pub monthly_premium: Decimal,
    pub employee_share: Decimal,
    pub max_benefit_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct HmoPlanUpdateDBRequest {
    pub provider_id: Option<HmoProviderId>,
    pub name: Option<String>,
    pub coverage: Option<Option<String>>,
    pub monthly_premium: Option<Decimal>,
    pub employee_share: Option<Decimal>,
    pub max_benefit_limit: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct HmoPlanDBResponse {
    #[serde(rename = "plan_id")]
    pub id: HmoPlanId,
    pub provider_id: HmoProviderId,
    pub name: String,
    pub coverage: Option<String>,
    pub monthly_premium: Decimal,
    /// Portion of the premium deducted from the employee's pay
    pub employee_share: Decimal,
    pub max_benefit_limit: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EnrollmentCreateDBRequest {
    pub employee_id: EmployeeId,
    pub plan_id: HmoPlanId,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentDBResponse {
    #[serde(rename = "enrollment_id")]
    pub id: EnrollmentId,
    pub employee_id: EmployeeId,
    pub plan_id: HmoPlanId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: EnrollmentStatus,
    pub status_changed_by: Option<UserId>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClaimCreateDBRequest {
    pub enrollment_id: EnrollmentId,
    pub amount: Decimal,
    pub service_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ClaimDBResponse {
    #[serde(rename = "claim_id")]
    pub id: ClaimId,
    pub claim_number: String,
    pub enrollment_id: EnrollmentId,
    pub amount: Decimal,
    pub service_date: NaiveDate,
    pub description: Option<String>,
    pub status: ClaimStatus,
    pub status_changed_by: Option<UserId>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Premium an active enrollment contributes to payroll
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PremiumDeduction {
    pub enrollment_id: EnrollmentId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub plan_id: HmoPlanId,
    pub plan_name: String,
    pub monthly_premium: Decimal,
    pub employee_share: Decimal,
    pub start_date: NaiveDate,
}
