//! API request/response models for user accounts.

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::{EmployeeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Job function of an account, which decides what it may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[serde(rename = "System Admin")]
    #[sqlx(rename = "System Admin")]
    SystemAdmin,
    #[serde(rename = "HR Manager")]
    #[sqlx(rename = "HR Manager")]
    HrManager,
    #[serde(rename = "HR Staff")]
    #[sqlx(rename = "HR Staff")]
    HrStaff,
    #[serde(rename = "Payroll Officer")]
    #[sqlx(rename = "Payroll Officer")]
    PayrollOfficer,
    Manager,
    Employee,
}

impl Role {
    pub const NAMES: &'static [&'static str] = &[
        "System Admin",
        "HR Manager",
        "HR Staff",
        "Payroll Officer",
        "Manager",
        "Employee",
    ];

    pub const ALL: &'static [Role] = &[
        Role::SystemAdmin,
        Role::HrManager,
        Role::HrStaff,
        Role::PayrollOfficer,
        Role::Manager,
        Role::Employee,
    ];
}

/// The authenticated caller, loaded fresh from the database on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(value_type = Option<Role>)]
    pub role: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Value>,
    #[schema(value_type = Option<bool>)]
    pub two_factor_enabled: Option<Value>,
}

/// A create request that passed field validation; the password is still plain text
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub two_factor_enabled: bool,
}

impl UserCreate {
    pub fn validate(self) -> Result<NewUser, Error> {
        let mut v = Validator::new();
        let email = v.required_email("email", self.email);
        let password = match self.password.filter(|p| !p.is_empty()) {
            Some(p) => Some(p),
            None => {
                v.error("password", "password is required");
                None
            }
        };
        let role = v.required_enum("role", self.role, Role::NAMES);
        let employee_id = v.optional_id("employee_id", self.employee_id);
        let two_factor_enabled = v.optional_bool("two_factor_enabled", self.two_factor_enabled);

        v.finish(|| {
            Some(NewUser {
                email: email?,
                password: password?,
                role: role?,
                employee_id,
                two_factor_enabled: two_factor_enabled.unwrap_or(false),
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    /// New password, set by an administrator
    pub password: Option<String>,
    #[schema(value_type = Option<Role>)]
    pub role: Option<String>,
    /// `null` unlinks the employee record
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub employee_id: Option<Option<Value>>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
    #[schema(value_type = Option<bool>)]
    pub two_factor_enabled: Option<Value>,
}

/// An update request that passed field validation
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub employee_id: Option<Option<EmployeeId>>,
    pub is_active: Option<bool>,
    pub two_factor_enabled: Option<bool>,
}

impl UserUpdate {
    pub fn validate(self) -> Result<UserChanges, Error> {
        let mut v = Validator::new();
        let email = v.optional_email("email", self.email);
        let role = v.optional_enum("role", self.role, Role::NAMES);
        let employee_id = v.nullable_id("employee_id", self.employee_id);
        let is_active = v.optional_bool("is_active", self.is_active);
        let two_factor_enabled = v.optional_bool("two_factor_enabled", self.two_factor_enabled);

        v.finish(|| {
            Some(UserChanges {
                email,
                password: self.password.filter(|p| !p.is_empty()),
                role,
                employee_id,
                is_active,
                two_factor_enabled,
            })
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub is_active: bool,
    pub two_factor_enabled: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            user_id: db.id,
            email: db.email,
            role: db.role,
            employee_id: db.employee_id,
            is_active: db.is_active,
            two_factor_enabled: db.two_factor_enabled,
            last_login: db.last_login,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            role: db.role,
            employee_id: db.employee_id,
        }
    }
}

/// Query parameters for listing users
#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only users with this role
    pub role: Option<Role>,

    /// Case-insensitive substring of the email address
    pub search: Option<String>,

    /// Include deactivated accounts
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::HrManager).unwrap(), json!("HR Manager"));
        assert_eq!(serde_json::to_value(Role::Employee).unwrap(), json!("Employee"));
        let parsed: Role = serde_json::from_value(json!("Payroll Officer")).unwrap();
        assert_eq!(parsed, Role::PayrollOfficer);
        assert_eq!(Role::NAMES.len(), Role::ALL.len());
    }

    #[test]
    fn test_create_requires_fields() {
        let request: UserCreate = serde_json::from_value(json!({"role": "Chief"})).unwrap();
        match request.validate().unwrap_err() {
            Error::Validation { errors } => {
                assert_eq!(errors["email"], "email is required");
                assert_eq!(errors["password"], "password is required");
                assert!(errors["role"].starts_with("role must be one of"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_update_can_unlink_employee() {
        let request: UserUpdate = serde_json::from_value(json!({"employee_id": null, "is_active": 0})).unwrap();
        let changes = request.validate().unwrap();
        assert_eq!(changes.employee_id, Some(None));
        assert_eq!(changes.is_active, Some(false));
        assert_eq!(changes.role, None);
    }

    #[test]
    fn test_list_query_with_flattened_pagination() {
        let uri: axum::http::Uri = "/users?page=2&limit=5&role=HR%20Staff&include_inactive=true".parse().unwrap();
        let axum::extract::Query(query) = axum::extract::Query::<ListUsersQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination.page(), 2);
        assert_eq!(query.pagination.limit(), 5);
        assert_eq!(query.role, Some(Role::HrStaff));
        assert_eq!(query.include_inactive, Some(true));
    }
}
