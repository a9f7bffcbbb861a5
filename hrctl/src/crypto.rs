//! HMAC-SHA256 signed, time-limited document share tokens.
//!
//! A token has the form `{document_id}.{expires_at}.{signature}` where `expires_at` is a unix
//! timestamp in seconds and `signature` is the base64url HMAC-SHA256 of
//! `{document_id}.{expires_at}` keyed by the application secret. Tokens carry everything
//! needed to verify them, so nothing is stored server side.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::types::DocumentId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareTokenError {
    #[error("share token is malformed")]
    Malformed,
    #[error("share token signature does not match")]
    BadSignature,
    #[error("share token has expired")]
    Expired,
}

fn signature(document_id: DocumentId, expires_at: i64, secret: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{document_id}.{expires_at}").as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Sign a share token for `document_id` valid until `expires_at`.
pub fn sign_share_token(document_id: DocumentId, expires_at: DateTime<Utc>, secret: &str) -> Option<String> {
    let expires = expires_at.timestamp();
    let sig = signature(document_id, expires, secret)?;
    Some(format!("{document_id}.{expires}.{}", URL_SAFE_NO_PAD.encode(sig)))
}

/// Verify a share token and return the document it grants access to.
pub fn verify_share_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<DocumentId, ShareTokenError> {
    let mut parts = token.splitn(3, '.');
    let (Some(id), Some(expires), Some(sig)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ShareTokenError::Malformed);
    };

    let document_id: DocumentId = id.parse().map_err(|_| ShareTokenError::Malformed)?;
    let expires_at: i64 = expires.parse().map_err(|_| ShareTokenError::Malformed)?;
    let provided = URL_SAFE_NO_PAD.decode(sig).map_err(|_| ShareTokenError::Malformed)?;

    let expected = signature(document_id, expires_at, secret).ok_or(ShareTokenError::BadSignature)?;
    if !constant_time_eq(&provided, &expected) {
        return Err(ShareTokenError::BadSignature);
    }

    if now.timestamp() >= expires_at {
        return Err(ShareTokenError::Expired);
    }

    Ok(document_id)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_valid_token_round_trip() {
        let now = Utc::now();
        let token = sign_share_token(42, now + Duration::minutes(30), SECRET).unwrap();
        assert!(token.starts_with("42."));
        assert_eq!(verify_share_token(&token, SECRET, now), Ok(42));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let token = sign_share_token(7, now - Duration::seconds(1), SECRET).unwrap();
        assert_eq!(verify_share_token(&token, SECRET, now), Err(ShareTokenError::Expired));
    }

    #[test]
    fn test_tampered_document_id() {
        let now = Utc::now();
        let token = sign_share_token(7, now + Duration::hours(1), SECRET).unwrap();
        let tampered = token.replacen("7.", "8.", 1);
        assert_eq!(verify_share_token(&tampered, SECRET, now), Err(ShareTokenError::BadSignature));
    }

    #[test]
    fn test_extended_expiry_is_rejected() {
        let now = Utc::now();
        let expires = now + Duration::minutes(5);
        let token = sign_share_token(7, expires, SECRET).unwrap();
        let extended = token.replacen(
            &expires.timestamp().to_string(),
            &(expires + Duration::days(30)).timestamp().to_string(),
            1,
        );
        assert_eq!(verify_share_token(&extended, SECRET, now), Err(ShareTokenError::BadSignature));
    }

    #[test]
    fn test_wrong_secret() {
        let now = Utc::now();
        let token = sign_share_token(7, now + Duration::hours(1), SECRET).unwrap();
        assert_eq!(verify_share_token(&token, "other", now), Err(ShareTokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let now = Utc::now();
        for token in ["", "abc", "1.2", "x.100.sig", "1.y.sig", "1.100.!!!"] {
            assert_eq!(verify_share_token(token, SECRET, now), Err(ShareTokenError::Malformed), "{token}");
        }
    }
}
