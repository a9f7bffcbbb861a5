//! Database repository for employee documents. Bytes live in [`crate::storage`]; this
//! table holds the metadata.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::sql::deactivate,
        models::documents::{DocumentCreateDBRequest, DocumentDBResponse},
    },
    types::{DocumentId, EmployeeId},
};

pub struct Documents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Documents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(employee_id = request.employee_id, size = request.size_bytes), err)]
    pub async fn create(&mut self, request: &DocumentCreateDBRequest) -> Result<DocumentDBResponse> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(
            r#"
            INSERT INTO employee_documents (
                employee_id, document_type, description, file_name, stored_path, content_type, size_bytes, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.document_type)
        .bind(&request.description)
        .bind(&request.file_name)
        .bind(&request.stored_path)
        .bind(&request.content_type)
        .bind(request.size_bytes)
        .bind(request.uploaded_by)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(document)
    }

    /// Active documents only; deleted ones behave as missing
    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: DocumentId) -> Result<Option<DocumentDBResponse>> {
        let document =
            sqlx::query_as::<_, DocumentDBResponse>("SELECT * FROM employee_documents WHERE id = $1 AND is_active")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(document)
    }

    #[instrument(skip(self), err)]
    pub async fn list_for_employee(&mut self, employee_id: EmployeeId) -> Result<Vec<DocumentDBResponse>> {
        let documents = sqlx::query_as::<_, DocumentDBResponse>(
            "SELECT * FROM employee_documents WHERE employee_id = $1 AND is_active ORDER BY created_at DESC, id DESC",
        )
        .bind(employee_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(documents)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: DocumentId) -> Result<bool> {
        deactivate(self.db, "employee_documents", id).await
    }
}
