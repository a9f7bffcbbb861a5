//! API request and response data models.
//!
//! These structures define the public API contract and are kept apart from the database
//! models, so storage and wire formats can evolve independently.
//!
//! Create and update bodies are deliberately permissive: every field is optional and
//! numbers may arrive as strings. Each body has a `validate` method that runs the
//! [`validation::Validator`] over it and yields the typed database request, reporting every
//! failing field at once.
//!
//! Responses reuse the database row types where the wire shape is identical, exposing the
//! primary key as `<entity>_id`.
//!
//! # Shared
//!
//! - [`response`]: The success envelope
//! - [`pagination`]: Page parameters and page metadata
//! - [`validation`]: Field validation for permissive bodies
//!
//! # Resources
//!
//! - [`auth`]: Login, two-factor and password payloads
//! - [`users`]: Accounts, roles and the authenticated caller
//! - [`employees`], [`departments`], [`branches`], [`positions`]: Organization
//! - [`salaries`], [`payroll`]: Salaries, bonuses, deductions, runs and payslips
//! - [`benefits`], [`hmo`]: Benefits catalog, HMO plans, enrollments and claims
//! - [`compensation`]: Salary grades, pay bands and approval workflows
//! - [`documents`]: Employee document metadata and share links
//! - [`analytics`], [`reports`]: Metrics, reports and the dashboard

pub mod analytics;
pub mod auth;
pub mod benefits;
pub mod branches;
pub mod compensation;
pub mod departments;
pub mod documents;
pub mod employees;
pub mod hmo;
pub mod pagination;
pub mod payroll;
pub mod positions;
pub mod reports;
pub mod response;
pub mod salaries;
pub mod users;
pub mod validation;
