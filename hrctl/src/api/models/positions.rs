//! API request/response models for job positions.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::positions::{PositionCreateDBRequest, PositionDBResponse, PositionUpdateDBRequest};
use crate::errors::Error;
use crate::types::DepartmentId;

pub type PositionResponse = PositionDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PositionCreate {
    pub title: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub department_id: Option<Value>,
    pub description: Option<String>,
}

impl PositionCreate {
    pub fn validate(self) -> Result<PositionCreateDBRequest, Error> {
        let mut v = Validator::new();
        let title = v.required_text("title", self.title);
        let department_id = v.optional_id("department_id", self.department_id);
        let description = v.optional_text(self.description);
        v.finish(|| {
            Some(PositionCreateDBRequest {
                title: title?,
                department_id,
                description,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PositionUpdate {
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub department_id: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl PositionUpdate {
    pub fn validate(self) -> Result<PositionUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = PositionUpdateDBRequest {
            title: v.optional_text(self.title),
            department_id: v.nullable_id("department_id", self.department_id),
            description: v.nullable_text(self.description),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPositionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub department_id: Option<DepartmentId>,

    /// Case-insensitive substring of the title
    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}
