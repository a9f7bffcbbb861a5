//! API request/response models for hospital branches.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::branches::{BranchCreateDBRequest, BranchDBResponse, BranchUpdateDBRequest};
use crate::errors::Error;

pub type BranchResponse = BranchDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BranchCreate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl BranchCreate {
    pub fn validate(self) -> Result<BranchCreateDBRequest, Error> {
        let mut v = Validator::new();
        let name = v.required_text("name", self.name);
        let address = v.optional_text(self.address);
        let phone = v.optional_text(self.phone);
        v.finish(|| {
            Some(BranchCreateDBRequest {
                name: name?,
                address,
                phone,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BranchUpdate {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl BranchUpdate {
    pub fn validate(self) -> Result<BranchUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let request = BranchUpdateDBRequest {
            name: v.optional_text(self.name),
            address: v.nullable_text(self.address),
            phone: v.nullable_text(self.phone),
            is_active: v.optional_bool("is_active", self.is_active),
        };
        v.finish(|| Some(request))
    }
}

/// Query parameters shared by the simple catalog listings (branches, departments,
/// benefit categories, HMO providers, salary grades)
#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCatalogQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring of the name
    pub search: Option<String>,

    /// Include deactivated entries
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}
