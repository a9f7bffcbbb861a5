//! Database repository for emailed two-factor challenges.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::password,
    db::{
        errors::{DbError, Result},
        models::two_factor::{TwoFactorChallenge, TwoFactorChallengeCreateRequest},
    },
};

pub struct TwoFactorChallenges<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TwoFactorChallenges<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store a new challenge, hashing the code
    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &TwoFactorChallengeCreateRequest) -> Result<TwoFactorChallenge> {
        let code_hash = password::hash_string_blocking(request.raw_code.clone())
            .await
            .map_err(|e| DbError::Other(anyhow::anyhow!(e)))?;

        let challenge = sqlx::query_as::<_, TwoFactorChallenge>(
            r#"
            INSERT INTO two_factor_challenges (id, user_id, code_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(code_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(challenge)
    }

    #[instrument(skip(self), err)]
    pub async fn get_for_update(&mut self, id: Uuid) -> Result<Option<TwoFactorChallenge>> {
        let challenge = sqlx::query_as::<_, TwoFactorChallenge>("SELECT * FROM two_factor_challenges WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(challenge)
    }

    #[instrument(skip(self), err)]
    pub async fn record_failed_attempt(&mut self, id: Uuid) -> Result<i32> {
        let attempts = sqlx::query_scalar::<_, i32>(
            "UPDATE two_factor_challenges SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(attempts)
    }

    #[instrument(skip(self), err)]
    pub async fn consume(&mut self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE two_factor_challenges SET consumed_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }
}
