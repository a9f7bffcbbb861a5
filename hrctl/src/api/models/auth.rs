//! Request and response bodies for the `/api/auth` routes.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::models::{response::ApiResponse, users::UserResponse};

/// Request to login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Session token issued after a successful sign in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPayload {
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl TokenPayload {
    pub fn bearer(token: String, expires_at: DateTime<Utc>, user: UserResponse) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            user,
        }
    }
}

/// Returned instead of a token when the account has two-factor sign in enabled
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TwoFactorChallengeResponse {
    pub two_factor_required: bool,
    /// Pass back to `/api/auth/verify-2fa` together with the emailed code
    pub challenge_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Either a session or a pending second factor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LoginOutcome {
    Session(TokenPayload),
    TwoFactorRequired(TwoFactorChallengeResponse),
}

/// Request to complete a two-factor sign in
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyTwoFactorRequest {
    pub challenge_id: Uuid,
    /// Six digit code from the email
    pub code: String,
}

/// Request to change password (for authenticated users)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password (for verification)
    pub current_password: String,
    /// New password
    pub new_password: String,
}

/// Request to initiate password reset
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    /// Email address to send reset link to
    pub email: String,
}

/// Request to confirm password reset with token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetConfirmRequest {
    /// Reset token from email
    pub token: String,
    /// New password
    pub new_password: String,
}

/// An envelope that also sets (or clears) the session cookie
pub struct WithSessionCookie<T> {
    pub cookie: String,
    pub response: ApiResponse<T>,
}

impl<T: Serialize> IntoResponse for WithSessionCookie<T> {
    fn into_response(self) -> Response {
        ([(header::SET_COOKIE, self.cookie)], self.response).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use serde_json::json;

    fn user() -> UserResponse {
        UserResponse {
            user_id: 3,
            email: "staff@hospital.local".to_string(),
            role: Role::HrStaff,
            employee_id: None,
            is_active: true,
            two_factor_enabled: false,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_outcome_is_flat() {
        let outcome = LoginOutcome::Session(TokenPayload::bearer("abc".to_string(), Utc::now(), user()));
        let value = serde_json::to_value(outcome).unwrap();
        assert_eq!(value["token"], "abc");
        assert_eq!(value["token_type"], "Bearer");
        assert_eq!(value["user"]["user_id"], 3);
        assert!(value.get("two_factor_required").is_none());
    }

    #[test]
    fn test_two_factor_outcome_shape() {
        let challenge_id = Uuid::new_v4();
        let outcome = LoginOutcome::TwoFactorRequired(TwoFactorChallengeResponse {
            two_factor_required: true,
            challenge_id,
            expires_at: Utc::now(),
        });
        let value = serde_json::to_value(outcome).unwrap();
        assert_eq!(value["two_factor_required"], true);
        assert_eq!(value["challenge_id"], json!(challenge_id));
        assert!(value.get("token").is_none());
    }

    #[tokio::test]
    async fn test_cookie_header_is_set() {
        let response = WithSessionCookie {
            cookie: "hrctl_session=tok; Path=/".to_string(),
            response: ApiResponse::message_only("Logged out"),
        }
        .into_response();
        assert_eq!(response.headers()[header::SET_COOKIE], "hrctl_session=tok; Path=/");
    }
}
