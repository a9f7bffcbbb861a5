//! Authentication and authorization.
//!
//! # Authentication
//!
//! Users sign in with email and password at `/api/auth/login`. When the account has
//! two-factor sign in enabled, a six digit code is emailed and the session token is only
//! issued by `/api/auth/verify-2fa`. Session tokens are HS256 JWTs, sent either as
//! `Authorization: Bearer <token>` or in the session cookie.
//!
//! The [`CurrentUser`](crate::api::models::users::CurrentUser) extractor verifies the token
//! and reloads the account on every request, so a deactivated account loses access
//! immediately even while its token is unexpired.
//!
//! # Authorization
//!
//! Every account has one role. [`permissions`] holds the table of which roles may perform
//! which operation on which resource, and the `RequiresPermission` extractor that enforces
//! it.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated user
//! - [`password`]: Argon2 hashing, reset tokens and verification codes
//! - [`permissions`]: Policy table and permission extractors
//! - [`session`]: JWT creation and verification

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
