//! API request/response models for departments.

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::validation::Validator;
use crate::db::models::departments::{DepartmentCreateDBRequest, DepartmentDBResponse, DepartmentUpdateDBRequest};
use crate::errors::Error;

pub type DepartmentResponse = DepartmentDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DepartmentCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Employee heading the department
    #[schema(value_type = Option<i64>)]
    pub manager_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub branch_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub budget: Option<Value>,
}

impl DepartmentCreate {
    pub fn validate(self) -> Result<DepartmentCreateDBRequest, Error> {
        let mut v = Validator::new();
        let name = v.required_text("name", self.name);
        let description = v.optional_text(self.description);
        let manager_id = v.optional_id("manager_id", self.manager_id);
        let branch_id = v.optional_id("branch_id", self.branch_id);
        let budget = v.optional_amount("budget", self.budget);
        v.finish(|| {
            Some(DepartmentCreateDBRequest {
                name: name?,
                description,
                manager_id,
                branch_id,
                budget,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DepartmentUpdate {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub manager_id: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub branch_id: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub budget: Option<Option<Value>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl DepartmentUpdate {
    pub fn validate(self) -> Result<DepartmentUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = DepartmentUpdateDBRequest {
            name: v.optional_text(self.name),
            description: v.nullable_text(self.description),
            manager_id: v.nullable_id("manager_id", self.manager_id),
            branch_id: v.nullable_id("branch_id", self.branch_id),
            budget: v.nullable_amount("budget", self.budget),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_negative_budget_rejected() {
        let request: DepartmentCreate = serde_json::from_value(json!({"name": "ICU", "budget": -5})).unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => assert_eq!(errors["budget"], "budget must not be negative"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_budget_can_be_cleared() {
        let request: DepartmentUpdate = serde_json::from_value(json!({"budget": null})).unwrap();
        assert_eq!(request.validate().unwrap().budget, Some(None));
    }
}
