//! Password hashing, one-time secrets and password policy.
//!
//! Argon2 is deliberately slow, so request handlers go through the `*_blocking` wrappers
//! which move the work onto tokio's blocking pool.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;
use std::sync::OnceLock;

use crate::{config::PasswordConfig, errors::Error};

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a secret (password, reset token or verification code) with Argon2id.
pub fn hash_string(input: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2Params::default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a secret against a stored hash. Parameters come from the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// [`hash_string`] on the blocking pool.
pub async fn hash_string_blocking(input: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash_string(&input))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn hashing task: {e}"),
        })?
}

/// [`verify_string`] on the blocking pool.
pub async fn verify_string_blocking(input: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_string(&input, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn verification task: {e}"),
        })?
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Verify `input` against a throwaway hash and discard the result.
///
/// Login calls this when no stored hash exists, so an unknown email costs the same argon2
/// work as a wrong password.
pub async fn verify_against_dummy(input: String) -> Result<(), Error> {
    let hash = match DUMMY_HASH.get() {
        Some(hash) => hash.clone(),
        None => {
            let hash = hash_string_blocking(generate_reset_token()).await?;
            DUMMY_HASH.get_or_init(|| hash).clone()
        }
    };
    verify_string_blocking(input, hash).await?;
    Ok(())
}

/// Generate a secure random token for password reset links
pub fn generate_reset_token() -> String {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Six digit code for email based two-factor sign in, zero padded
pub fn generate_verification_code() -> String {
    format!("{:06}", rng().random_range(0..1_000_000u32))
}

/// Check a candidate password against the configured length rules.
pub fn validate_password(password: &str, rules: &PasswordConfig) -> Result<(), Error> {
    let length = password.chars().count();
    if length < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if length > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters", rules.max_length),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hashing() {
        let hash = hash_string("test_password_123").unwrap();
        assert!(!hash.is_empty());
        assert!(verify_string("test_password_123", &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let hash1 = hash_string("same_password").unwrap();
        let hash2 = hash_string("same_password").unwrap();
        assert_ne!(hash1, hash2);
        assert!(verify_string("same_password", &hash1).unwrap());
        assert!(verify_string("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_string("anything", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_string_blocking("night-shift".to_string()).await.unwrap();
        assert!(verify_string_blocking("night-shift".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_string_blocking("day-shift".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_dummy_verification_reuses_one_hash() {
        verify_against_dummy("guess-one".to_string()).await.unwrap();
        let first = DUMMY_HASH.get().cloned().unwrap();
        verify_against_dummy("guess-two".to_string()).await.unwrap();
        assert_eq!(DUMMY_HASH.get(), Some(&first));
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn test_generate_reset_token() {
        let token1 = generate_reset_token();
        let token2 = generate_reset_token();
        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 43);
        assert!(token1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_verification_code_shape() {
        for _ in 0..50 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_validate_password_lengths() {
        let rules = PasswordConfig {
            min_length: 8,
            max_length: 12,
        };
        assert!(validate_password("short", &rules).is_err());
        assert!(validate_password("just-right", &rules).is_ok());
        assert!(validate_password("much-too-long-password", &rules).is_err());
    }
}
