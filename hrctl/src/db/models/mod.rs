//! Database record models.
//!
//! Each table gets a `*DBResponse` row type deriving `sqlx::FromRow`, plus
//! `*CreateDBRequest`/`*UpdateDBRequest` structs holding already validated input. Row types
//! also serve as API responses; the API layer aliases them rather than copying fields.

pub mod benefits;
pub mod branches;
pub mod compensation;
pub mod departments;
pub mod documents;
pub mod employees;
pub mod hmo;
pub mod password_reset_tokens;
pub mod payroll;
pub mod positions;
pub mod reports;
pub mod salaries;
pub mod two_factor;
pub mod users;
