//! Service error type and the failure half of the response envelope.
//!
//! Every handler returns [`Result<T>`]. Failures render as
//! `{"success": false, "message": "...", "error": <kind or field map>}` with the status
//! code from [`Error::status_code`]. Internal details are logged, never returned.

use std::collections::BTreeMap;

use crate::db::errors::{DbError, describe_unique_violation};
use crate::types::{Operation, Resource};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// User lacks required permissions for the operation
    #[error("Insufficient permissions to {action} {resource}")]
    InsufficientPermissions { action: Operation, resource: Resource },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// One or more fields failed validation, keyed by field name
    #[error("Validation failed: {errors:?}")]
    Validation { errors: BTreeMap<String, String> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Status change not allowed from the entity's current state
    #[error("Cannot {action} {resource} in status {from}")]
    InvalidTransition { resource: String, from: String, action: String },

    /// Conflict with existing state, e.g. a duplicate entry
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Route exists but not for this HTTP method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Error from a write addressed by id, naming the entity when the row is missing
    pub fn from_lookup(err: DbError, resource: &str, id: impl ToString) -> Self {
        match err {
            DbError::NotFound => Error::not_found(resource, id),
            other => Error::Database(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidTransition { .. } | Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable error kind carried in the envelope's `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "unauthenticated",
            Error::InsufficientPermissions { .. } => "forbidden",
            Error::BadRequest { .. } => "bad_request",
            Error::Validation { .. } => "validation_failed",
            Error::NotFound { .. } | Error::Database(DbError::NotFound) => "not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::Conflict { .. } | Error::Database(DbError::UniqueViolation { .. }) => "conflict",
            Error::MethodNotAllowed => "method_not_allowed",
            Error::Database(DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. }) => "bad_request",
            Error::Internal { .. } | Error::Database(DbError::Other(_)) | Error::Other(_) => "internal_error",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { action, resource } => {
                format!("Insufficient permissions to {action} {resource}")
            }
            Error::BadRequest { message } => message.clone(),
            Error::Validation { .. } => "Validation failed".to_string(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::InvalidTransition { resource, from, action } => {
                format!("Cannot {action} {resource} with status {from}")
            }
            Error::Conflict { message } => message.clone(),
            Error::MethodNotAllowed => "Method not allowed".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => {
                    describe_unique_violation(table.as_deref(), constraint.as_deref()).to_string()
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    fn error_detail(&self) -> Value {
        match self {
            Error::Validation { errors } => json!(errors),
            _ => Value::String(self.kind().to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::InvalidTransition { .. } | Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } | Error::MethodNotAllowed => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = json!({
            "success": false,
            "message": self.user_message(),
            "error": self.error_detail(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.into())
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "email is required".to_string());
        errors.insert("first_name".to_string(), "first_name is required".to_string());

        let (status, body) = render(Error::Validation { errors }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["error"]["email"], "email is required");
        assert_eq!(body["error"]["first_name"], "first_name is required");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak() {
        let (status, body) = render(Error::Other(anyhow::anyhow!("connection refused at 10.0.0.3"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "internal_error");
    }

    #[tokio::test]
    async fn test_invalid_transition_is_conflict() {
        let (status, body) = render(Error::InvalidTransition {
            resource: "claim".to_string(),
            from: "Approved".to_string(),
            action: "deny".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_transition");
        assert_eq!(body["message"], "Cannot deny claim with status Approved");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::InsufficientPermissions {
                action: Operation::Delete,
                resource: Resource::Employees
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Error::not_found("Employee", 3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            Error::Database(DbError::ForeignKeyViolation {
                constraint: None,
                table: None,
                message: String::new()
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
