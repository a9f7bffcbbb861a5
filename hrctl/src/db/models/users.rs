//! Database models for users.

use crate::api::models::users::{Role, UserChanges};
use crate::types::{EmployeeId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub two_factor_enabled: bool,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub employee_id: Option<Option<EmployeeId>>,
    pub is_active: Option<bool>,
    pub two_factor_enabled: Option<bool>,
}

impl UserUpdateDBRequest {
    /// Validated changes plus the hash of the new password, if one was given
    pub fn new(changes: UserChanges, password_hash: Option<String>) -> Self {
        Self {
            email: changes.email,
            password_hash,
            role: changes.role,
            employee_id: changes.employee_id,
            is_active: changes.is_active,
            two_factor_enabled: changes.two_factor_enabled,
        }
    }
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub is_active: bool,
    pub two_factor_enabled: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
