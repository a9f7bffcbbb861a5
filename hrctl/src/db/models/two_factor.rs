//! Database models for emailed two-factor sign in challenges.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::UserId;

#[derive(Debug, Clone, FromRow)]
pub struct TwoFactorChallenge {
    pub id: Uuid,
    pub user_id: UserId,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TwoFactorChallenge {
    /// Still accepting guesses: unconsumed, unexpired and under the attempt limit
    pub fn is_open(&self, now: DateTime<Utc>, max_attempts: i32) -> bool {
        self.consumed_at.is_none() && self.expires_at > now && self.attempts < max_attempts
    }
}

#[derive(Debug, Clone)]
pub struct TwoFactorChallengeCreateRequest {
    pub user_id: UserId,
    pub raw_code: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn challenge(attempts: i32, expires_in: Duration, consumed: bool) -> TwoFactorChallenge {
        let now = Utc::now();
        TwoFactorChallenge {
            id: Uuid::new_v4(),
            user_id: 1,
            code_hash: String::new(),
            attempts,
            expires_at: now + expires_in,
            consumed_at: consumed.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn test_is_open() {
        let now = Utc::now();
        assert!(challenge(0, Duration::minutes(5), false).is_open(now, 5));
        assert!(!challenge(5, Duration::minutes(5), false).is_open(now, 5));
        assert!(!challenge(0, Duration::minutes(-1), false).is_open(now, 5));
        assert!(!challenge(0, Duration::minutes(5), true).is_open(now, 5));
    }
}
