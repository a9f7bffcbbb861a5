//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Extracting the path, query and body through the envelope-aware extractors
//! - Authorization, via `RequiresPermission` or an explicit check when the outcome
//!   depends on the record being touched
//! - Calling the database repositories, inside a transaction when more than one row changes
//! - Wrapping the result in [`ApiResponse`](crate::api::models::response::ApiResponse)
//!
//! # Handler Modules
//!
//! - [`auth`]: Login, two-factor verification, logout, password change and reset
//! - [`users`]: Account CRUD
//! - [`employees`], [`departments`], [`branches`], [`positions`]: Organization
//! - [`salaries`]: Salaries, bonuses and deductions
//! - [`payroll`]: Payroll runs, their lifecycle, and payslips
//! - [`benefits`]: Benefit categories, benefits and assignments
//! - [`hmo`]: HMO providers, plans, enrollments and claims
//! - [`integrations`]: HMO premiums flowing into payroll deductions
//! - [`compensation`]: Salary grades, pay bands, grade mappings and approval workflows
//! - [`documents`]: Employee document upload, download and share links
//! - [`analytics`]: Cached HR metrics
//! - [`reports`]: Reports and the dashboard
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Result`], whose error half renders the failure envelope
//! with the matching status code.

pub mod analytics;
pub mod auth;
pub mod benefits;
pub mod branches;
pub mod compensation;
pub mod departments;
pub mod documents;
pub mod employees;
pub mod hmo;
pub mod integrations;
pub mod payroll;
pub mod positions;
pub mod reports;
pub mod salaries;
pub mod users;
