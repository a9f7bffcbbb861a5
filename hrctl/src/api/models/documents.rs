//! API request/response models for employee documents.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::validation::Validator;
use crate::db::models::documents::DocumentDBResponse;
use crate::errors::Error;

pub type DocumentResponse = DocumentDBResponse;

/// Shape of the multipart upload, for the OpenAPI document only
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct DocumentUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub document_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ShareDocumentRequest {
    /// Lifetime of the link; defaults to the configured share link TTL
    #[schema(value_type = Option<i64>)]
    pub expires_in_minutes: Option<Value>,
}

impl ShareDocumentRequest {
    /// Resolve the requested lifetime against the configured default and ceiling
    pub fn lifetime(self, default: std::time::Duration, max: std::time::Duration) -> Result<Duration, Error> {
        let mut v = Validator::new();
        let minutes = v.optional_integer("expires_in_minutes", self.expires_in_minutes);
        let max_minutes = (max.as_secs() / 60) as i64;
        if let Some(minutes) = minutes {
            v.check(
                minutes > 0 && minutes <= max_minutes,
                "expires_in_minutes",
                format!("expires_in_minutes must be between 1 and {max_minutes}"),
            );
        }
        v.finish(|| {
            Some(match minutes {
                Some(minutes) => Duration::minutes(minutes),
                None => Duration::seconds(default.as_secs() as i64),
            })
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareLinkResponse {
    pub token: String,
    /// Absolute download URL that works without logging in
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    const HOUR: StdDuration = StdDuration::from_secs(3600);
    const WEEK: StdDuration = StdDuration::from_secs(7 * 24 * 3600);

    #[test]
    fn test_default_lifetime() {
        let lifetime = ShareDocumentRequest::default().lifetime(HOUR, WEEK).unwrap();
        assert_eq!(lifetime, Duration::hours(1));
    }

    #[test]
    fn test_requested_lifetime_is_bounded() {
        let ok: ShareDocumentRequest = serde_json::from_value(json!({"expires_in_minutes": 30})).unwrap();
        assert_eq!(ok.lifetime(HOUR, WEEK).unwrap(), Duration::minutes(30));

        let too_long: ShareDocumentRequest = serde_json::from_value(json!({"expires_in_minutes": 20_000})).unwrap();
        assert!(too_long.lifetime(HOUR, WEEK).is_err());

        let zero: ShareDocumentRequest = serde_json::from_value(json!({"expires_in_minutes": 0})).unwrap();
        assert!(zero.lifetime(HOUR, WEEK).is_err());
    }
}
