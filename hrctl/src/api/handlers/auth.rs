use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    api::{
        extract::ApiJson,
        models::{
            auth::{
                ChangePasswordRequest, LoginOutcome, LoginRequest, PasswordResetConfirmRequest, PasswordResetRequest,
                TokenPayload, TwoFactorChallengeResponse, VerifyTwoFactorRequest, WithSessionCookie,
            },
            response::ApiResponse,
            users::{CurrentUser, UserResponse},
        },
    },
    auth::{password, session},
    config::Config,
    db::{
        handlers::{PasswordResetTokens, Repository, TwoFactorChallenges, Users},
        models::{
            password_reset_tokens::PasswordResetTokenCreateRequest, two_factor::TwoFactorChallengeCreateRequest,
            users::UserDBResponse,
        },
    },
    email::EmailService,
    errors::{Error, Result},
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

fn invalid_code() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid or expired verification code".to_string()),
    }
}

fn chrono_duration(duration: std::time::Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration).map_err(|e| Error::Internal {
        operation: format!("convert duration: {e}"),
    })
}

fn session_cookie(token: &str, config: &Config) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={}",
        config.auth.session_cookie_name,
        token,
        config.auth.jwt_expiry.as_secs()
    )
}

/// Issue a JWT for the account and wrap it in the login envelope plus cookie
fn issue_session(user: UserDBResponse, config: &Config) -> Result<WithSessionCookie<LoginOutcome>> {
    let (token, expires_at) = session::create_session_token(&CurrentUser::from(&user), config)?;
    let cookie = session_cookie(&token, config);
    let payload = TokenPayload::bearer(token, expires_at, UserResponse::from(user));

    Ok(WithSessionCookie {
        cookie,
        response: ApiResponse::ok(LoginOutcome::Session(payload)).with_message("Login successful"),
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    summary = "Sign in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token, or a two-factor challenge when the account requires it", body = LoginOutcome),
        (status = 401, description = "Invalid credentials or deactivated account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> Result<Response> {
    let mut conn = state.db.acquire().await?;
    let mut users = Users::new(&mut conn);

    let account = users.get_user_by_email(&request.email).await?;
    let Some((user, hash)) = account.and_then(|user| user.password_hash.clone().map(|hash| (user, hash))) else {
        password::verify_against_dummy(request.password).await?;
        return Err(invalid_credentials());
    };

    if !password::verify_string_blocking(request.password, hash).await? {
        info!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    if user.two_factor_enabled {
        let ttl = state.config.auth.two_factor.code_ttl;
        let code = password::generate_verification_code();
        let challenge = TwoFactorChallenges::new(&mut conn)
            .create(&TwoFactorChallengeCreateRequest {
                user_id: user.id,
                raw_code: code.clone(),
                expires_at: Utc::now() + chrono_duration(ttl)?,
            })
            .await?;

        EmailService::new(&state.config)?.send_two_factor_code(&user.email, &code, ttl).await?;

        let outcome = LoginOutcome::TwoFactorRequired(TwoFactorChallengeResponse {
            two_factor_required: true,
            challenge_id: challenge.id,
            expires_at: challenge.expires_at,
        });
        return Ok(ApiResponse::ok(outcome)
            .with_message("Verification code sent to your email")
            .into_response());
    }

    users.record_login(user.id).await?;
    Ok(issue_session(user, &state.config)?.into_response())
}

/// Complete a two-factor sign in
#[utoipa::path(
    post,
    path = "/auth/verify-2fa",
    tag = "auth",
    summary = "Verify two-factor code",
    request_body = VerifyTwoFactorRequest,
    responses(
        (status = 200, description = "Session token", body = TokenPayload),
        (status = 401, description = "Wrong, expired or exhausted code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_two_factor(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyTwoFactorRequest>,
) -> Result<WithSessionCookie<LoginOutcome>> {
    let mut tx = state.db.begin().await?;

    let challenge = TwoFactorChallenges::new(&mut tx)
        .get_for_update(request.challenge_id)
        .await?
        .ok_or_else(invalid_code)?;

    if !challenge.is_open(Utc::now(), state.config.auth.two_factor.max_attempts) {
        return Err(invalid_code());
    }

    if !password::verify_string_blocking(request.code.trim().to_string(), challenge.code_hash.clone()).await? {
        let attempts = TwoFactorChallenges::new(&mut tx).record_failed_attempt(challenge.id).await?;
        tx.commit().await?;
        info!(user_id = challenge.user_id, attempts, "Rejected two-factor code");
        return Err(invalid_code());
    }

    TwoFactorChallenges::new(&mut tx).consume(challenge.id).await?;

    let mut users = Users::new(&mut tx);
    let user = match users.get_by_id(challenge.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(invalid_code()),
    };
    users.record_login(user.id).await?;
    tx.commit().await?;

    issue_session(user, &state.config)
}

/// Logout (clear session cookie)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    summary = "Sign out",
    responses(
        (status = 200, description = "Logged out"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> WithSessionCookie<()> {
    WithSessionCookie {
        cookie: format!(
            "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
            state.config.auth.session_cookie_name
        ),
        response: ApiResponse::message_only("Logged out successfully"),
    }
}

/// Get the signed in account
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    summary = "Current user",
    responses(
        (status = 200, description = "The authenticated account", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<UserResponse>> {
    let mut conn = state.db.acquire().await?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", current_user.id))?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

/// Change the caller's own password
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    summary = "Change password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password does not meet the rules"),
        (status = 401, description = "Current password is wrong"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>> {
    password::validate_password(&request.new_password, &state.config.auth.password)?;

    let mut conn = state.db.acquire().await?;
    let mut users = Users::new(&mut conn);
    let user = users
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", current_user.id))?;

    let hash = user.password_hash.ok_or_else(|| Error::BadRequest {
        message: "Account has no password set".to_string(),
    })?;
    if !password::verify_string_blocking(request.current_password, hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let new_hash = password::hash_string_blocking(request.new_password).await?;
    users.set_password_hash(user.id, &new_hash).await?;

    Ok(ApiResponse::message_only("Password changed successfully"))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/auth/password-resets",
    tag = "auth",
    summary = "Request password reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent when the account exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetRequest>,
) -> Result<ApiResponse<()>> {
    // Same answer whether or not the account exists
    let acknowledgement = ApiResponse::message_only("If an account with that email exists, a password reset link has been sent.");

    let mut tx = state.db.begin().await?;
    let Some(user) = Users::new(&mut tx).get_user_by_email(&request.email).await? else {
        return Ok(acknowledgement);
    };
    if !user.is_active {
        return Ok(acknowledgement);
    }

    let valid_for = state.config.auth.password_reset_token_duration;
    let raw_token = password::generate_reset_token();
    let token = PasswordResetTokens::new(&mut tx)
        .create(&PasswordResetTokenCreateRequest {
            user_id: user.id,
            raw_token: raw_token.clone(),
            expires_at: Utc::now() + chrono_duration(valid_for)?,
        })
        .await?;

    EmailService::new(&state.config)?
        .send_password_reset_email(&user.email, &token.id, &raw_token, valid_for)
        .await?;
    tx.commit().await?;

    Ok(acknowledgement)
}

/// Set a new password with an emailed reset token
#[utoipa::path(
    post,
    path = "/auth/password-resets/{token_id}/confirm",
    tag = "auth",
    summary = "Confirm password reset",
    params(("token_id" = uuid::Uuid, Path, description = "Reset token id from the email link")),
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired token, or password rules not met"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Path(token_id): Path<Uuid>,
    ApiJson(request): ApiJson<PasswordResetConfirmRequest>,
) -> Result<ApiResponse<()>> {
    let invalid_token = || Error::BadRequest {
        message: "Invalid or expired reset token".to_string(),
    };

    password::validate_password(&request.new_password, &state.config.auth.password)?;

    let mut tx = state.db.begin().await?;
    let token = PasswordResetTokens::new(&mut tx)
        .get_for_update(token_id)
        .await?
        .ok_or_else(invalid_token)?;

    if !token.is_usable(Utc::now()) {
        return Err(invalid_token());
    }
    if !password::verify_string_blocking(request.token, token.token_hash.clone()).await? {
        warn!(user_id = token.user_id, "Password reset attempted with wrong token");
        return Err(invalid_token());
    }

    let new_hash = password::hash_string_blocking(request.new_password).await?;
    Users::new(&mut tx).set_password_hash(token.user_id, &new_hash).await?;
    PasswordResetTokens::new(&mut tx).consume_all_for_user(token.user_id).await?;
    tx.commit().await?;

    Ok(ApiResponse::message_only("Password has been reset"))
}
