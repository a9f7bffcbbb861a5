//! API request/response models for HMO providers, plans, enrollments and claims.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::hmo::{
    ClaimCreateDBRequest, ClaimDBResponse, EnrollmentCreateDBRequest, EnrollmentDBResponse, HmoPlanCreateDBRequest,
    HmoPlanDBResponse, HmoPlanUpdateDBRequest, HmoProviderCreateDBRequest, HmoProviderDBResponse, HmoProviderUpdateDBRequest,
    PremiumDeduction,
};
use crate::errors::Error;
use crate::lifecycle::{ClaimStatus, EnrollmentStatus};
use crate::types::{EmployeeId, EnrollmentId, HmoPlanId, HmoProviderId};

pub type HmoProviderResponse = HmoProviderDBResponse;
pub type HmoPlanResponse = HmoPlanDBResponse;
pub type EnrollmentResponse = EnrollmentDBResponse;
pub type ClaimResponse = ClaimDBResponse;
pub type PremiumDeductionResponse = PremiumDeduction;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HmoProviderCreate {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl HmoProviderCreate {
    pub fn validate(self) -> Result<HmoProviderCreateDBRequest, Error> {
        let mut v = Validator::new();
        let name = v.required_text("name", self.name);
        let contact_person = v.optional_text(self.contact_person);
        let email = v.optional_email("email", self.email);
        let phone = v.optional_text(self.phone);
        v.finish(|| {
            Some(HmoProviderCreateDBRequest {
                name: name?,
                contact_person,
                email,
                phone,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HmoProviderUpdate {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl HmoProviderUpdate {
    pub fn validate(self) -> Result<HmoProviderUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let email = match self.email {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match v.optional_text(Some(raw)) {
                None => Some(None),
                Some(text) => v.optional_email("email", Some(text)).map(Some),
            },
        };
        let request = HmoProviderUpdateDBRequest {
            name: v.optional_text(self.name),
            contact_person: v.nullable_text(self.contact_person),
            email,
            phone: v.nullable_text(self.phone),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HmoPlanCreate {
    #[schema(value_type = Option<i64>)]
    pub provider_id: Option<Value>,
    pub name: Option<String>,
    pub coverage: Option<String>,
    #[schema(value_type = Option<String>)]
    pub monthly_premium: Option<Value>,
    /// Defaults to 0
    #[schema(value_type = Option<String>)]
    pub employee_share: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub max_benefit_limit: Option<Value>,
}

impl HmoPlanCreate {
    pub fn validate(self) -> Result<HmoPlanCreateDBRequest, Error> {
        let mut v = Validator::new();
        let provider_id = v.required_id("provider_id", self.provider_id);
        let name = v.required_text("name", self.name);
        let coverage = v.optional_text(self.coverage);
        let monthly_premium = v.required_amount("monthly_premium", self.monthly_premium);
        let employee_share = v.optional_amount("employee_share", self.employee_share).unwrap_or_default();
        let max_benefit_limit = v.optional_amount("max_benefit_limit", self.max_benefit_limit);
        if let Some(premium) = monthly_premium {
            v.check(
                employee_share <= premium,
                "employee_share",
                "employee_share must not exceed monthly_premium",
            );
        }
        v.finish(|| {
            Some(HmoPlanCreateDBRequest {
                provider_id: provider_id?,
                name: name?,
                coverage,
                monthly_premium: monthly_premium?,
                employee_share,
                max_benefit_limit,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HmoPlanUpdate {
    #[schema(value_type = Option<i64>)]
    pub provider_id: Option<Value>,
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub coverage: Option<Option<String>>,
    #[schema(value_type = Option<String>)]
    pub monthly_premium: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub employee_share: Option<Value>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub max_benefit_limit: Option<Option<Value>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl HmoPlanUpdate {
    pub fn validate(self, existing: &HmoPlanDBResponse) -> Result<HmoPlanUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = HmoPlanUpdateDBRequest {
            provider_id: v.optional_id("provider_id", self.provider_id),
            name: v.optional_text(self.name),
            coverage: v.nullable_text(self.coverage),
            monthly_premium: v.optional_amount("monthly_premium", self.monthly_premium),
            employee_share: v.optional_amount("employee_share", self.employee_share),
            max_benefit_limit: v.nullable_amount("max_benefit_limit", self.max_benefit_limit),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        let premium = request.monthly_premium.unwrap_or(existing.monthly_premium);
        let share = request.employee_share.unwrap_or(existing.employee_share);
        v.check(share <= premium, "employee_share", "employee_share must not exceed monthly_premium");
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPlansQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub provider_id: Option<HmoProviderId>,

    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollmentCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub plan_id: Option<Value>,
    /// Defaults to today
    pub start_date: Option<String>,
}

impl EnrollmentCreate {
    pub fn validate(self) -> Result<EnrollmentCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let plan_id = v.required_id("plan_id", self.plan_id);
        let start_date = v.optional_date("start_date", self.start_date);
        v.finish(|| {
            Some(EnrollmentCreateDBRequest {
                employee_id: employee_id?,
                plan_id: plan_id?,
                start_date,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EnrollmentTermination {
    /// Defaults to today
    pub end_date: Option<String>,
    #[serde(alias = "comment")]
    pub reason: Option<String>,
}

/// Validated termination details
#[derive(Debug, Clone)]
pub struct TerminationDetails {
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl EnrollmentTermination {
    pub fn validate(self, today: NaiveDate) -> Result<TerminationDetails, Error> {
        let mut v = Validator::new();
        let end_date = v.optional_date("end_date", self.end_date);
        let reason = v.optional_text(self.reason);
        v.finish(|| {
            Some(TerminationDetails {
                end_date: end_date.unwrap_or(today),
                reason,
            })
        })
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEnrollmentsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub plan_id: Option<HmoPlanId>,

    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClaimCreate {
    #[schema(value_type = Option<i64>)]
    pub enrollment_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Value>,
    /// Defaults to today
    pub service_date: Option<String>,
    pub description: Option<String>,
}

impl ClaimCreate {
    pub fn validate(self) -> Result<ClaimCreateDBRequest, Error> {
        let mut v = Validator::new();
        let enrollment_id = v.required_id("enrollment_id", self.enrollment_id);
        let amount = v.required_amount("amount", self.amount);
        if let Some(amount) = amount {
            v.check(!amount.is_zero(), "amount", "amount must be greater than zero");
        }
        let service_date = v.optional_date("service_date", self.service_date);
        let description = v.optional_text(self.description);
        v.finish(|| {
            Some(ClaimCreateDBRequest {
                enrollment_id: enrollment_id?,
                amount: amount?,
                service_date,
                description,
            })
        })
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListClaimsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub enrollment_id: Option<EnrollmentId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    pub status: Option<ClaimStatus>,
}

/// Outcome of syncing HMO premiums into payroll deductions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PremiumSyncSummary {
    pub created: u64,
    pub updated: u64,
    pub deactivated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_amount_must_be_positive() {
        let request: ClaimCreate = serde_json::from_value(json!({"enrollment_id": 1, "amount": 0})).unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => assert_eq!(errors["amount"], "amount must be greater than zero"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plan_share_capped_by_premium() {
        let request: HmoPlanCreate = serde_json::from_value(json!({
            "provider_id": 1,
            "name": "Gold",
            "monthly_premium": "1200",
            "employee_share": "1500"
        }))
        .unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => {
                assert_eq!(errors["employee_share"], "employee_share must not exceed monthly_premium")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_termination_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let details = EnrollmentTermination::default().validate(today).unwrap();
        assert_eq!(details.end_date, today);
        assert_eq!(details.reason, None);

        let explicit: EnrollmentTermination =
            serde_json::from_value(json!({"end_date": "2025-07-15", "comment": "resigned"})).unwrap();
        let details = explicit.validate(today).unwrap();
        assert_eq!(details.end_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        assert_eq!(details.reason.as_deref(), Some("resigned"));
    }

    #[test]
    fn test_provider_email_validated_and_clearable() {
        let bad: HmoProviderUpdate = serde_json::from_value(json!({"email": "nope"})).unwrap();
        assert!(bad.validate().is_err());
        let cleared: HmoProviderUpdate = serde_json::from_value(json!({"email": null})).unwrap();
        assert_eq!(cleared.validate().unwrap().email, Some(None));
    }
}
