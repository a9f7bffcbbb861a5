//! Database models for job positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{DepartmentId, PositionId};

#[derive(Debug, Clone)]
pub struct PositionCreateDBRequest {
    pub title: String,
    pub department_id: Option<DepartmentId>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PositionUpdateDBRequest {
    pub title: Option<String>,
    pub department_id: Option<Option<DepartmentId>>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PositionDBResponse {
    #[serde(rename = "position_id")]
    pub id: PositionId,
    pub title: String,
    pub department_id: Option<DepartmentId>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
