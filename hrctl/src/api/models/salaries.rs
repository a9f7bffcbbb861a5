//! API request/response models for salaries, bonuses and deductions.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::salaries::{
    BonusCreateDBRequest, BonusDBResponse, BonusUpdateDBRequest, DeductionCreateDBRequest, DeductionDBResponse,
    DeductionUpdateDBRequest, SalaryCreateDBRequest, SalaryDBResponse, SalaryUpdateDBRequest,
};
use crate::errors::Error;
use crate::types::EmployeeId;

pub type SalaryResponse = SalaryDBResponse;
pub type BonusResponse = BonusDBResponse;
pub type DeductionResponse = DeductionDBResponse;

/// How often a salary is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "pay_frequency", rename_all = "snake_case")]
pub enum PayFrequency {
    Monthly,
    SemiMonthly,
    BiWeekly,
    Weekly,
}

impl PayFrequency {
    pub const NAMES: [&'static str; 4] = ["monthly", "semi_monthly", "bi_weekly", "weekly"];

    /// Amount paid per pay period for a salary stated per month, rounded to cents
    pub fn per_period(self, monthly: Decimal) -> Decimal {
        let amount = match self {
            PayFrequency::Monthly => monthly,
            PayFrequency::SemiMonthly => monthly / Decimal::from(2),
            PayFrequency::BiWeekly => monthly * Decimal::from(12) / Decimal::from(26),
            PayFrequency::Weekly => monthly * Decimal::from(12) / Decimal::from(52),
        };
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SalaryCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    /// Monthly base salary
    #[schema(value_type = Option<String>)]
    pub base_salary: Option<Value>,
    pub pay_frequency: Option<String>,
    pub effective_date: Option<String>,
    /// Defaults to true; a current salary supersedes the employee's previous one
    #[schema(value_type = Option<bool>)]
    pub is_current: Option<Value>,
}

impl SalaryCreate {
    pub fn validate(self) -> Result<SalaryCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let base_salary = v.required_amount("base_salary", self.base_salary);
        let pay_frequency = v.optional_enum("pay_frequency", self.pay_frequency, &PayFrequency::NAMES);
        let effective_date = v.optional_date("effective_date", self.effective_date);
        let is_current = v.optional_bool("is_current", self.is_current).unwrap_or(true);
        v.finish(|| {
            Some(SalaryCreateDBRequest {
                employee_id: employee_id?,
                base_salary: base_salary?,
                pay_frequency,
                effective_date,
                is_current,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SalaryUpdate {
    #[schema(value_type = Option<String>)]
    pub base_salary: Option<Value>,
    pub pay_frequency: Option<String>,
    pub effective_date: Option<String>,
    #[schema(value_type = Option<bool>)]
    pub is_current: Option<Value>,
}

impl SalaryUpdate {
    pub fn validate(self) -> Result<SalaryUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = SalaryUpdateDBRequest {
            base_salary: v.optional_amount("base_salary", self.base_salary),
            pay_frequency: v.optional_enum("pay_frequency", self.pay_frequency, &PayFrequency::NAMES),
            effective_date: v.optional_date("effective_date", self.effective_date),
            is_current: v.optional_bool("is_current", self.is_current),
        };
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSalariesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    /// Only each employee's current salary
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub current_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BonusCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    pub bonus_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Value>,
    /// Defaults to today
    pub award_date: Option<String>,
    pub description: Option<String>,
}

impl BonusCreate {
    pub fn validate(self) -> Result<BonusCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let bonus_type = v.required_text("bonus_type", self.bonus_type);
        let amount = v.required_amount("amount", self.amount);
        let award_date = v.optional_date("award_date", self.award_date);
        let description = v.optional_text(self.description);
        v.finish(|| {
            Some(BonusCreateDBRequest {
                employee_id: employee_id?,
                bonus_type: bonus_type?,
                amount: amount?,
                award_date,
                description,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BonusUpdate {
    pub bonus_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Value>,
    pub award_date: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl BonusUpdate {
    pub fn validate(self) -> Result<BonusUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = BonusUpdateDBRequest {
            bonus_type: v.optional_text(self.bonus_type),
            amount: v.optional_amount("amount", self.amount),
            award_date: v.optional_date("award_date", self.award_date),
            description: v.nullable_text(self.description),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBonusesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    /// Awarded on or after this date
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    /// Awarded on or before this date
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeductionCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    pub deduction_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Value>,
    #[schema(value_type = Option<bool>)]
    pub is_recurring: Option<Value>,
    /// Defaults to today
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DeductionCreate {
    pub fn validate(self) -> Result<DeductionCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let deduction_type = v.required_text("deduction_type", self.deduction_type);
        let amount = v.required_amount("amount", self.amount);
        let is_recurring = v.optional_bool("is_recurring", self.is_recurring).unwrap_or(false);
        let start_date = v.optional_date("start_date", self.start_date);
        let end_date = v.optional_date("end_date", self.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            v.check(start <= end, "end_date", "end_date must not be before start_date");
        }
        v.finish(|| {
            Some(DeductionCreateDBRequest {
                employee_id: employee_id?,
                deduction_type: deduction_type?,
                amount: amount?,
                is_recurring,
                start_date,
                end_date,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeductionUpdate {
    pub deduction_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Value>,
    #[schema(value_type = Option<bool>)]
    pub is_recurring: Option<Value>,
    pub start_date: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub end_date: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl DeductionUpdate {
    pub fn validate(self) -> Result<DeductionUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = DeductionUpdateDBRequest {
            deduction_type: v.optional_text(self.deduction_type),
            amount: v.optional_amount("amount", self.amount),
            is_recurring: v.optional_bool("is_recurring", self.is_recurring),
            start_date: v.optional_date("start_date", self.start_date),
            end_date: v.nullable_date("end_date", self.end_date),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        if let (Some(start), Some(Some(end))) = (request.start_date, request.end_date) {
            v.check(start <= end, "end_date", "end_date must not be before start_date");
        }
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDeductionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    pub deduction_type: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn test_per_period_amounts() {
        let monthly = dec("52000.00");
        assert_eq!(PayFrequency::Monthly.per_period(monthly), dec("52000.00"));
        assert_eq!(PayFrequency::SemiMonthly.per_period(monthly), dec("26000.00"));
        assert_eq!(PayFrequency::BiWeekly.per_period(monthly), dec("24000.00"));
        assert_eq!(PayFrequency::Weekly.per_period(monthly), dec("12000.00"));
    }

    #[test]
    fn test_per_period_rounds_to_cents() {
        // 1000 * 12 / 26 = 461.538...
        assert_eq!(PayFrequency::BiWeekly.per_period(dec("1000")), dec("461.54"));
        assert_eq!(PayFrequency::SemiMonthly.per_period(dec("0.05")), dec("0.03"));
    }

    #[test]
    fn test_frequency_wire_names() {
        assert_eq!(serde_json::to_string(&PayFrequency::SemiMonthly).unwrap(), "\"semi_monthly\"");
        let parsed: PayFrequency = serde_json::from_value(json!("bi_weekly")).unwrap();
        assert_eq!(parsed, PayFrequency::BiWeekly);
    }

    #[test]
    fn test_salary_defaults_to_current() {
        let request: SalaryCreate = serde_json::from_value(json!({"employee_id": 1, "base_salary": "30000"})).unwrap();
        let validated = request.validate().unwrap();
        assert!(validated.is_current);
        assert_eq!(validated.pay_frequency, None);
    }

    #[test]
    fn test_unknown_frequency_rejected() {
        let request: SalaryCreate =
            serde_json::from_value(json!({"employee_id": 1, "base_salary": 10, "pay_frequency": "daily"})).unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => assert_eq!(
                errors["pay_frequency"],
                "pay_frequency must be one of: monthly, semi_monthly, bi_weekly, weekly"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_deduction_dates_must_be_ordered() {
        let request: DeductionCreate = serde_json::from_value(json!({
            "employee_id": 2,
            "deduction_type": "Loan",
            "amount": 100,
            "start_date": "2025-03-01",
            "end_date": "2025-02-01"
        }))
        .unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => assert_eq!(errors["end_date"], "end_date must not be before start_date"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bonus_date_range_query() {
        let uri: axum::http::Uri = "/api/bonuses?employee_id=4&from=2025-01-01&to=2025-03-31&page=2".parse().unwrap();
        let query = axum::extract::Query::<ListBonusesQuery>::try_from_uri(&uri).unwrap().0;
        assert_eq!(query.employee_id, Some(4));
        assert_eq!(query.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(query.to, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(query.pagination.page(), 2);
    }
}
