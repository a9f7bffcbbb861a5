//! API request/response models for compensation planning.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::compensation::{
    GradeMappingCreateDBRequest, GradeMappingDBResponse, GradeRevisionCreateDBRequest, GradeRevisionDBResponse,
    PayAdjustmentCreateDBRequest, PayAdjustmentDBResponse, PayBandCreateDBRequest, PayBandDBResponse, PayBandUpdateDBRequest,
    SalaryGradeCreateDBRequest, SalaryGradeDBResponse, SalaryGradeUpdateDBRequest,
};
use crate::errors::Error;
use crate::lifecycle::ApprovalStatus;
use crate::types::{EmployeeId, SalaryGradeId, UserId};

pub type SalaryGradeResponse = SalaryGradeDBResponse;
pub type PayBandResponse = PayBandDBResponse;
pub type GradeMappingResponse = GradeMappingDBResponse;
pub type PayAdjustmentResponse = PayAdjustmentDBResponse;
pub type GradeRevisionResponse = GradeRevisionDBResponse;

/// Record errors unless `min <= mid <= max`
fn check_band_order(v: &mut Validator, prefix: &str, min: Option<Decimal>, mid: Option<Decimal>, max: Option<Decimal>) {
    if let (Some(min), Some(mid)) = (min, mid) {
        v.check(
            min <= mid,
            &format!("{prefix}mid_salary"),
            format!("{prefix}mid_salary must not be below {prefix}min_salary"),
        );
    }
    if let (Some(mid), Some(max)) = (mid, max) {
        v.check(
            mid <= max,
            &format!("{prefix}max_salary"),
            format!("{prefix}max_salary must not be below {prefix}mid_salary"),
        );
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SalaryGradeCreate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SalaryGradeCreate {
    pub fn validate(self) -> Result<SalaryGradeCreateDBRequest, Error> {
        let mut v = Validator::new();
        let code = v.required_text("code", self.code).map(|c| c.to_uppercase());
        let name = v.required_text("name", self.name);
        let description = v.optional_text(self.description);
        v.finish(|| {
            Some(SalaryGradeCreateDBRequest {
                code: code?,
                name: name?,
                description,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SalaryGradeUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl SalaryGradeUpdate {
    pub fn validate(self) -> Result<SalaryGradeUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = SalaryGradeUpdateDBRequest {
            code: v.optional_text(self.code).map(|c| c.to_uppercase()),
            name: v.optional_text(self.name),
            description: v.nullable_text(self.description),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PayBandCreate {
    #[schema(value_type = Option<i64>)]
    pub grade_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub min_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub mid_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub max_salary: Option<Value>,
    pub effective_date: Option<String>,
}

impl PayBandCreate {
    pub fn validate(self) -> Result<PayBandCreateDBRequest, Error> {
        let mut v = Validator::new();
        let grade_id = v.required_id("grade_id", self.grade_id);
        let min_salary = v.required_amount("min_salary", self.min_salary);
        let mid_salary = v.required_amount("mid_salary", self.mid_salary);
        let max_salary = v.required_amount("max_salary", self.max_salary);
        let effective_date = v.optional_date("effective_date", self.effective_date);
        check_band_order(&mut v, "", min_salary, mid_salary, max_salary);
        v.finish(|| {
            Some(PayBandCreateDBRequest {
                grade_id: grade_id?,
                min_salary: min_salary?,
                mid_salary: mid_salary?,
                max_salary: max_salary?,
                effective_date,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PayBandUpdate {
    #[schema(value_type = Option<String>)]
    pub min_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub mid_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub max_salary: Option<Value>,
    pub effective_date: Option<String>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl PayBandUpdate {
    /// Ordering is checked against the band's stored figures for any not being changed
    pub fn validate(self, existing: &PayBandDBResponse) -> Result<PayBandUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = PayBandUpdateDBRequest {
            min_salary: v.optional_amount("min_salary", self.min_salary),
            mid_salary: v.optional_amount("mid_salary", self.mid_salary),
            max_salary: v.optional_amount("max_salary", self.max_salary),
            effective_date: v.optional_date("effective_date", self.effective_date),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        check_band_order(
            &mut v,
            "",
            Some(request.min_salary.unwrap_or(existing.min_salary)),
            Some(request.mid_salary.unwrap_or(existing.mid_salary)),
            Some(request.max_salary.unwrap_or(existing.max_salary)),
        );
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPayBandsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub grade_id: Option<SalaryGradeId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeMappingCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub grade_id: Option<Value>,
    /// Step within the grade, defaults to 1
    #[schema(value_type = Option<i32>)]
    pub step: Option<Value>,
    pub effective_date: Option<String>,
    /// Defaults to true; a current mapping replaces the employee's previous one
    #[schema(value_type = Option<bool>)]
    pub is_current: Option<Value>,
}

impl GradeMappingCreate {
    pub fn validate(self) -> Result<GradeMappingCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let grade_id = v.required_id("grade_id", self.grade_id);
        let step = v.optional_integer("step", self.step);
        if let Some(step) = step {
            v.check(step > 0 && step <= i64::from(i32::MAX), "step", "step must be a positive integer");
        }
        let effective_date = v.optional_date("effective_date", self.effective_date);
        let is_current = v.optional_bool("is_current", self.is_current).unwrap_or(true);
        v.finish(|| {
            Some(GradeMappingCreateDBRequest {
                employee_id: employee_id?,
                grade_id: grade_id?,
                step: step.and_then(|s| i32::try_from(s).ok()),
                effective_date,
                is_current,
            })
        })
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGradeMappingsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub grade_id: Option<SalaryGradeId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub current_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PayAdjustmentCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub proposed_salary: Option<Value>,
    /// e.g. "Promotion", "Merit increase"
    pub adjustment_type: Option<String>,
    pub reason: Option<String>,
    pub effective_date: Option<String>,
}

impl PayAdjustmentCreate {
    pub fn validate(self, requested_by: UserId) -> Result<PayAdjustmentCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let proposed_salary = v.required_amount("proposed_salary", self.proposed_salary);
        let adjustment_type = v.required_text("adjustment_type", self.adjustment_type);
        let reason = v.optional_text(self.reason);
        let effective_date = v.optional_date("effective_date", self.effective_date);
        v.finish(|| {
            Some(PayAdjustmentCreateDBRequest {
                employee_id: employee_id?,
                proposed_salary: proposed_salary?,
                adjustment_type: adjustment_type?,
                reason,
                effective_date,
                requested_by,
            })
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeRevisionCreate {
    #[schema(value_type = Option<i64>)]
    pub grade_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub proposed_min_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub proposed_mid_salary: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub proposed_max_salary: Option<Value>,
    pub reason: Option<String>,
}

impl GradeRevisionCreate {
    pub fn validate(self, requested_by: UserId) -> Result<GradeRevisionCreateDBRequest, Error> {
        let mut v = Validator::new();
        let grade_id = v.required_id("grade_id", self.grade_id);
        let min = v.required_amount("proposed_min_salary", self.proposed_min_salary);
        let mid = v.required_amount("proposed_mid_salary", self.proposed_mid_salary);
        let max = v.required_amount("proposed_max_salary", self.proposed_max_salary);
        let reason = v.optional_text(self.reason);
        check_band_order(&mut v, "proposed_", min, mid, max);
        v.finish(|| {
            Some(GradeRevisionCreateDBRequest {
                grade_id: grade_id?,
                proposed_min_salary: min?,
                proposed_mid_salary: mid?,
                proposed_max_salary: max?,
                reason,
                requested_by,
            })
        })
    }
}

/// Filter shared by the two approval workflows
#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListApprovalsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Pay adjustments only
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub employee_id: Option<EmployeeId>,

    /// Grade revisions only
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub grade_id: Option<SalaryGradeId>,

    pub status: Option<ApprovalStatus>,
}
