//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Extractors whose rejections use the standard error envelope
//!
//! # API Structure
//!
//! Everything lives under `/api`:
//!
//! - **Authentication** (`/api/auth/*`): Login, two-factor verification, password management
//! - **Users** (`/api/users/*`): Account management
//! - **Organization** (`/api/employees`, `/api/departments`, `/api/branches`, `/api/positions`)
//! - **Pay** (`/api/salaries`, `/api/bonuses`, `/api/deductions`, `/api/payroll/*`)
//! - **Benefits and HMO** (`/api/benefits/*`, `/api/hmo/*`, `/api/integrations/hmo_payroll/*`)
//! - **Compensation planning** (`/api/compensation_planning/*`)
//! - **Documents** (`/api/documents/*`, `/api/employees/{id}/documents`)
//! - **Insight** (`/api/hr_analytics/*`, `/api/reports/*`, `/api/dashboard`)
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`. The document is
//! served at `/api/openapi.json` and rendered at `/api/docs`.

pub mod extract;
pub mod handlers;
pub mod models;
