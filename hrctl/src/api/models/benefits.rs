//! API request/response models for benefits.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::benefits::{
    BenefitAssignmentCreateDBRequest, BenefitAssignmentDBResponse, BenefitCategoryCreateDBRequest, BenefitCategoryDBResponse,
    BenefitCategoryUpdateDBRequest, BenefitCreateDBRequest, BenefitDBResponse, BenefitUpdateDBRequest, EmployeeBenefitDBResponse,
};
use crate::errors::Error;
use crate::types::{BenefitCategoryId, BenefitId};

pub type BenefitCategoryResponse = BenefitCategoryDBResponse;
pub type BenefitResponse = BenefitDBResponse;
pub type BenefitAssignmentResponse = BenefitAssignmentDBResponse;
pub type EmployeeBenefitResponse = EmployeeBenefitDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BenefitCategoryCreate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl BenefitCategoryCreate {
    pub fn validate(self) -> Result<BenefitCategoryCreateDBRequest, Error> {
        let mut v = Validator::new();
        let name = v.required_text("name", self.name);
        let description = v.optional_text(self.description);
        v.finish(|| Some(BenefitCategoryCreateDBRequest { name: name?, description }))
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BenefitCategoryUpdate {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl BenefitCategoryUpdate {
    pub fn validate(self) -> Result<BenefitCategoryUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = BenefitCategoryUpdateDBRequest {
            name: v.optional_text(self.name),
            description: v.nullable_text(self.description),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BenefitCreate {
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Value>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Monetary value of the benefit, if it has one
    #[schema(value_type = Option<String>)]
    pub value: Option<Value>,
}

impl BenefitCreate {
    pub fn validate(self) -> Result<BenefitCreateDBRequest, Error> {
        let mut v = Validator::new();
        let category_id = v.required_id("category_id", self.category_id);
        let name = v.required_text("name", self.name);
        let description = v.optional_text(self.description);
        let value = v.optional_amount("value", self.value);
        v.finish(|| {
            Some(BenefitCreateDBRequest {
                category_id: category_id?,
                name: name?,
                description,
                value,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BenefitUpdate {
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Value>,
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub value: Option<Option<Value>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl BenefitUpdate {
    pub fn validate(self) -> Result<BenefitUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = BenefitUpdateDBRequest {
            category_id: v.optional_id("category_id", self.category_id),
            name: v.optional_text(self.name),
            description: v.nullable_text(self.description),
            value: v.nullable_amount("value", self.value),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BenefitAssignmentCreate {
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    /// Defaults to today
    pub start_date: Option<String>,
}

impl BenefitAssignmentCreate {
    pub fn validate(self, benefit_id: BenefitId) -> Result<BenefitAssignmentCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_id = v.required_id("employee_id", self.employee_id);
        let start_date = v.optional_date("start_date", self.start_date);
        v.finish(|| {
            Some(BenefitAssignmentCreateDBRequest {
                employee_id: employee_id?,
                benefit_id,
                start_date,
            })
        })
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBenefitsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub category_id: Option<BenefitCategoryId>,

    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_benefit_requires_category_and_name() {
        let request: BenefitCreate = serde_json::from_value(json!({"value": "12.5"})).unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => {
                assert_eq!(errors.len(), 2);
                assert!(errors.contains_key("category_id"));
                assert!(errors.contains_key("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_assignment_takes_benefit_from_path() {
        let request: BenefitAssignmentCreate =
            serde_json::from_value(json!({"employee_id": "8", "start_date": "2025-01-15"})).unwrap();
        let validated = request.validate(3).unwrap();
        assert_eq!(validated.benefit_id, 3);
        assert_eq!(validated.employee_id, 8);
        assert_eq!(validated.start_date, chrono::NaiveDate::from_ymd_opt(2025, 1, 15));
    }
}
