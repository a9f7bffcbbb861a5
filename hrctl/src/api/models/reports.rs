//! Query parameters for the fixed reports.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::IntoParams;

use crate::db::handlers::reports::PayrollScope;
use crate::errors::Error;
use crate::types::PayrollRunId;

pub use crate::db::models::reports::{
    BenefitsReportRow, DashboardSummary, HeadcountRow, HmoClaimsReportRow, PayrollSummaryRow,
};

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), Error> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(Error::BadRequest {
                    message: "from must not be after to".to_string(),
                });
            }
        }
        Ok((self.from, self.to))
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PayrollSummaryQuery {
    /// Summarize one run; takes precedence over `from`/`to`
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub run_id: Option<PayrollRunId>,

    /// Documented through [`DateRangeQuery`]
    #[serde(flatten)]
    #[param(ignore)]
    pub range: DateRangeQuery,
}

impl PayrollSummaryQuery {
    pub fn scope(&self) -> Result<PayrollScope, Error> {
        match self.run_id {
            Some(run_id) => Ok(PayrollScope::Run(run_id)),
            None => {
                let (from, to) = self.range.range()?;
                Ok(PayrollScope::Period { from, to })
            }
        }
    }
}
