//! Database models for payroll runs and payslips.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::api::models::salaries::PayFrequency;
use crate::lifecycle::PayrollRunStatus;
use crate::types::{EmployeeId, PayrollRunId, PayslipId, UserId};

#[derive(Debug, Clone)]
pub struct PayrollRunCreateDBRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub pay_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct PayrollRunUpdateDBRequest {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub pay_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PayrollRunDBResponse {
    #[serde(rename = "run_id")]
    pub id: PayrollRunId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub pay_date: NaiveDate,
    pub status: PayrollRunStatus,
    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub status_changed_by: Option<UserId>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pay inputs gathered for one employee over a run's period
#[derive(Debug, Clone, FromRow)]
pub struct PayslipInputs {
    pub employee_id: EmployeeId,
    pub base_salary: Decimal,
    pub pay_frequency: PayFrequency,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
}

impl PayslipInputs {
    /// gross = per-period basic pay + bonuses; net = gross - deductions
    pub fn compute(&self, payroll_run_id: PayrollRunId) -> PayslipCreateDBRequest {
        let basic_pay = self.pay_frequency.per_period(self.base_salary);
        let gross_pay = basic_pay + self.total_bonuses;
        PayslipCreateDBRequest {
            payroll_run_id,
            employee_id: self.employee_id,
            basic_pay,
            total_bonuses: self.total_bonuses,
            total_deductions: self.total_deductions,
            gross_pay,
            net_pay: gross_pay - self.total_deductions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipCreateDBRequest {
    pub payroll_run_id: PayrollRunId,
    pub employee_id: EmployeeId,
    pub basic_pay: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PayslipDBResponse {
    #[serde(rename = "payslip_id")]
    pub id: PayslipId,
    pub payroll_run_id: PayrollRunId,
    pub employee_id: EmployeeId,
    pub basic_pay: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_payslip_arithmetic() {
        let inputs = PayslipInputs {
            employee_id: 7,
            base_salary: Decimal::from(40_000),
            pay_frequency: PayFrequency::SemiMonthly,
            total_bonuses: Decimal::from_str("1500.25").unwrap(),
            total_deductions: Decimal::from_str("800.50").unwrap(),
        };
        let payslip = inputs.compute(3);
        assert_eq!(payslip.payroll_run_id, 3);
        assert_eq!(payslip.basic_pay, Decimal::from(20_000));
        assert_eq!(payslip.gross_pay, Decimal::from_str("21500.25").unwrap());
        assert_eq!(payslip.net_pay, Decimal::from_str("20699.75").unwrap());
    }

    #[test]
    fn test_net_pay_may_go_negative() {
        let inputs = PayslipInputs {
            employee_id: 1,
            base_salary: Decimal::from(100),
            pay_frequency: PayFrequency::Monthly,
            total_bonuses: Decimal::ZERO,
            total_deductions: Decimal::from(150),
        };
        assert_eq!(inputs.compute(1).net_pay, Decimal::from(-50));
    }
}
