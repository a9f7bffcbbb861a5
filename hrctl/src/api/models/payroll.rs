//! API request/response models for payroll runs and payslips.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::payroll::{PayrollRunCreateDBRequest, PayrollRunDBResponse, PayrollRunUpdateDBRequest, PayslipDBResponse};
use crate::errors::Error;
use crate::lifecycle::PayrollRunStatus;
use crate::types::{EmployeeId, PayrollRunId, UserId};

pub type PayrollRunResponse = PayrollRunDBResponse;
pub type PayslipResponse = PayslipDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PayrollRunCreate {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub pay_date: Option<String>,
    pub notes: Option<String>,
}

impl PayrollRunCreate {
    pub fn validate(self, created_by: UserId) -> Result<PayrollRunCreateDBRequest, Error> {
        let mut v = Validator::new();
        let period_start = v.required_date("period_start", self.period_start);
        let period_end = v.required_date("period_end", self.period_end);
        let pay_date = v.required_date("pay_date", self.pay_date);
        let notes = v.optional_text(self.notes);
        if let (Some(start), Some(end)) = (period_start, period_end) {
            v.check(start <= end, "period_end", "period_end must not be before period_start");
        }
        v.finish(|| {
            Some(PayrollRunCreateDBRequest {
                period_start: period_start?,
                period_end: period_end?,
                pay_date: pay_date?,
                notes,
                created_by,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PayrollRunUpdate {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub pay_date: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

impl PayrollRunUpdate {
    /// Validate against the run being edited, so a partial change to the period is checked
    /// together with the bound it leaves untouched
    pub fn validate(self, existing: &PayrollRunDBResponse) -> Result<PayrollRunUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = PayrollRunUpdateDBRequest {
            period_start: v.optional_date("period_start", self.period_start),
            period_end: v.optional_date("period_end", self.period_end),
            pay_date: v.optional_date("pay_date", self.pay_date),
            notes: v.nullable_text(self.notes),
        };
        let start = request.period_start.unwrap_or(existing.period_start);
        let end = request.period_end.unwrap_or(existing.period_end);
        v.check(start <= end, "period_end", "period_end must not be before period_start");
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPayrollRunsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub status: Option<PayrollRunStatus>,
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPayslipsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub run_id: Option<PayrollRunId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,
}

/// Outcome of processing a run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessedPayrollRun {
    pub run: PayrollRunResponse,
    pub payslips_generated: usize,
}
