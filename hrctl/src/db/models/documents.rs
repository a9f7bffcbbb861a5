//! Database models for employee documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{DocumentId, EmployeeId, UserId};

#[derive(Debug, Clone)]
pub struct DocumentCreateDBRequest {
    pub employee_id: EmployeeId,
    pub document_type: String,
    pub description: Option<String>,
    pub file_name: String,
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: UserId,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct DocumentDBResponse {
    #[serde(rename = "document_id")]
    pub id: DocumentId,
    pub employee_id: EmployeeId,
    pub document_type: String,
    pub description: Option<String>,
    /// Name as uploaded
    pub file_name: String,
    /// Location relative to the storage root, never sent to clients
    #[serde(skip_serializing, default)]
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<UserId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
