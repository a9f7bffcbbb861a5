//! Row types for the fixed reports and the dashboard.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{BenefitId, DepartmentId, EmployeeId, PayrollRunId};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct HeadcountRow {
    pub department_id: DepartmentId,
    pub department: String,
    pub active: i64,
    pub inactive: i64,
    pub total: i64,
}

/// One employee's pay over the selected run or period
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PayrollSummaryRow {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub department: String,
    pub payslips: i64,
    pub basic_pay: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct BenefitsReportRow {
    pub benefit_id: BenefitId,
    pub benefit: String,
    pub category: String,
    pub active_assignments: i64,
    /// `value` times active assignments, zero for benefits without a value
    pub total_value: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct HmoClaimsReportRow {
    pub provider: String,
    pub plan: String,
    pub status: String,
    pub claims: i64,
    pub total_amount: Decimal,
}

/// Latest completed payroll run, as shown on the dashboard
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct CompletedRunTotals {
    pub run_id: PayrollRunId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub pay_date: NaiveDate,
    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct DashboardCounts {
    pub active_employees: i64,
    pub departments: i64,
    /// Runs in Draft or Processing
    pub open_payroll_runs: i64,
    pub pending_claims: i64,
    pub pending_pay_adjustments: i64,
    pub active_enrollments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub last_completed_run: Option<CompletedRunTotals>,
}
