use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    db::handlers::{Repository, Users},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Pull a session token out of the request.
///
/// The `Authorization: Bearer` header wins over the session cookie. Returns `Ok(None)` when
/// neither is present.
fn extract_token<'a>(parts: &'a Parts, config: &Config) -> Result<Option<&'a str>> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|e| Error::BadRequest {
            message: format!("Invalid authorization header: {e}"),
        })?;
        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
            _ => Err(Error::Unauthenticated {
                message: Some("Authorization header must use the Bearer scheme".to_string()),
            }),
        };
    }

    let Some(cookie_header) = parts.headers.get(header::COOKIE) else {
        return Ok(None);
    };
    let cookie_str = cookie_header.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid cookie header: {e}"),
    })?;

    let cookie_name = &config.auth.session_cookie_name;
    Ok(cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| name == cookie_name)
        .map(|(_, value)| value))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = extract_token(parts, &state.config)? else {
            trace!("No session token on request");
            return Err(Error::Unauthenticated { message: None });
        };

        let claims = session::verify_session_token(token, &state.config)?;

        // Roles and activation can change after the token was issued, so reload the account
        let mut conn = state.db.acquire().await?;
        let user = Users::new(&mut conn).get_by_id(claims.id).await?;

        match user {
            Some(user) if user.is_active => {
                debug!("Authenticated user {}", user.id);
                Ok(CurrentUser::from(&user))
            }
            Some(_) => Err(Error::Unauthenticated {
                message: Some("Account is deactivated".to_string()),
            }),
            None => Err(Error::Unauthenticated {
                message: Some("Invalid or expired token".to_string()),
            }),
        }
    }
}
