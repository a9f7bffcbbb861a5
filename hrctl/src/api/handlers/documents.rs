//! Employee document upload, download and share links.
//!
//! Files are written through [`crate::storage::DocumentStorage`]; the database row only
//! records where they went. Share links are signed tokens (see [`crate::crypto`]) and need
//! no session to redeem.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tokio_util::io::ReaderStream;

use crate::{
    AppState,
    api::{
        extract::{EntityId, OptionalJson},
        models::{
            documents::{DocumentResponse, DocumentUpload, ShareDocumentRequest, ShareLinkResponse},
            response::ApiResponse,
            users::CurrentUser,
            validation::Validator,
        },
    },
    auth::permissions::{RequiresPermission, operation, require_create, require_read, resource},
    crypto::{ShareTokenError, sign_share_token, verify_share_token},
    db::{
        handlers::{Documents, Employees, Repository},
        models::documents::{DocumentCreateDBRequest, DocumentDBResponse},
    },
    errors::{Error, Result},
    types::Resource,
};

/// Fields collected from the upload form
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    contents: Option<Vec<u8>>,
    document_type: Option<String>,
    description: Option<String>,
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                let mut field = field;
                let mut contents = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read file: {e}"),
                })? {
                    if contents.len() + chunk.len() > max_bytes {
                        return Err(Error::BadRequest {
                            message: format!("File exceeds the maximum size of {max_bytes} bytes"),
                        });
                    }
                    contents.extend_from_slice(&chunk);
                }
                form.contents = Some(contents);
            }
            "document_type" | "description" => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read field {name}: {e}"),
                })?;
                if name == "document_type" {
                    form.document_type = Some(value);
                } else {
                    form.description = Some(value);
                }
            }
            // Unknown fields are drained and ignored
            _ => {}
        }
    }
    Ok(form)
}

fn share_secret(state: &AppState) -> Result<&str> {
    state.config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "Document share links: secret_key is required".to_string(),
    })
}

/// `Content-Disposition` for `file_name`, with characters that would break the quoted header
/// value replaced by `_`
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// Stream a stored document back as an attachment
async fn attachment(state: &AppState, document: &DocumentDBResponse) -> Result<Response> {
    let file = state.storage.open(&document.stored_path).await?;
    let disposition = attachment_disposition(&document.file_name);
    let headers = [
        (header::CONTENT_TYPE, document.content_type.clone()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

async fn load_document(state: &AppState, id: i64) -> Result<DocumentDBResponse> {
    let mut conn = state.db.acquire().await?;
    Documents::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Document", id))
}

/// Upload a document for an employee
#[utoipa::path(
    post,
    path = "/employees/{id}/documents",
    tag = "documents",
    summary = "Upload document",
    params(("id" = i64, Path, description = "Employee id")),
    request_body(content = DocumentUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing file or document type, or file too large"),
        (status = 403, description = "Not your own record"),
        (status = 404, description = "Employee not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_document(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<DocumentResponse>> {
    require_create(&current_user, Resource::Documents, id)?;
    {
        let mut conn = state.db.acquire().await?;
        Employees::new(&mut conn)
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Employee", id))?;
    }

    let form = read_upload(multipart, state.config.documents.max_upload_bytes).await?;
    let mut v = Validator::new();
    let document_type = v.required_text("document_type", form.document_type);
    let description = v.optional_text(form.description);
    let contents = form.contents.filter(|bytes| !bytes.is_empty());
    v.check(contents.is_some(), "file", "file is required and must not be empty");
    let (document_type, contents) = v.finish(|| Some((document_type?, contents?)))?;

    let file_name = form.file_name.unwrap_or_else(|| "document".to_string());
    let content_type = mime_guess::from_path(&file_name).first_or_octet_stream().to_string();
    let stored = state.storage.store(id, &file_name, &contents).await?;

    let request = DocumentCreateDBRequest {
        employee_id: id,
        document_type,
        description,
        file_name,
        stored_path: stored.relative_path.clone(),
        content_type,
        size_bytes: stored.size_bytes as i64,
        uploaded_by: current_user.id,
    };
    let mut conn = state.db.acquire().await?;
    let document = match Documents::new(&mut conn).create(&request).await {
        Ok(document) => document,
        Err(e) => {
            // Do not leave an orphaned file behind
            if let Err(cleanup) = state.storage.remove(&stored.relative_path).await {
                tracing::warn!(error = %cleanup, "Failed to remove orphaned document file");
            }
            return Err(e.into());
        }
    };

    tracing::info!(document_id = document.id, size = document.size_bytes, "Document uploaded");
    Ok(ApiResponse::created(document).with_message("Document uploaded successfully"))
}

/// List an employee's documents
#[utoipa::path(
    get,
    path = "/employees/{id}/documents",
    tag = "documents",
    summary = "List employee documents",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Active documents, newest first", body = Vec<DocumentResponse>),
        (status = 403, description = "Not your own record"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_employee_documents(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<Vec<DocumentResponse>>> {
    require_read(&current_user, Resource::Documents, id)?;
    let mut conn = state.db.acquire().await?;
    let documents = Documents::new(&mut conn).list_for_employee(id).await?;
    Ok(ApiResponse::ok(documents))
}

/// Get document metadata
#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    summary = "Get document",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_document(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<ApiResponse<DocumentResponse>> {
    let document = load_document(&state, id).await?;
    require_read(&current_user, Resource::Documents, document.employee_id)?;
    Ok(ApiResponse::ok(document))
}

/// Download a document
#[utoipa::path(
    get,
    path = "/documents/{id}/download",
    tag = "documents",
    summary = "Download document",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn download_document(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
) -> Result<Response> {
    let document = load_document(&state, id).await?;
    require_read(&current_user, Resource::Documents, document.employee_id)?;
    attachment(&state, &document).await
}

/// Delete a document
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    summary = "Delete document",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_document(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    _: RequiresPermission<resource::Documents, operation::Delete>,
) -> Result<ApiResponse<()>> {
    let mut conn = state.db.acquire().await?;
    if !Documents::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Document", id));
    }
    Ok(ApiResponse::message_only("Document deleted successfully"))
}

/// Create a time-limited share link for a document
#[utoipa::path(
    post,
    path = "/documents/{id}/share",
    tag = "documents",
    summary = "Share document",
    params(("id" = i64, Path, description = "Document id")),
    request_body(content = ShareDocumentRequest, description = "Optional link lifetime"),
    responses(
        (status = 200, description = "Share link", body = ShareLinkResponse),
        (status = 400, description = "Lifetime out of range"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn share_document(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    current_user: CurrentUser,
    OptionalJson(request): OptionalJson<ShareDocumentRequest>,
) -> Result<ApiResponse<ShareLinkResponse>> {
    let document = load_document(&state, id).await?;
    require_read(&current_user, Resource::Documents, document.employee_id)?;

    let documents = &state.config.documents;
    let lifetime = request.lifetime(documents.share_link_ttl, documents.max_share_link_ttl)?;
    let expires_at = Utc::now() + lifetime;
    let token = sign_share_token(document.id, expires_at, share_secret(&state)?).ok_or_else(|| Error::Internal {
        operation: "sign document share token".to_string(),
    })?;
    let url = state.config.public_url(&format!("/api/documents/shared/{token}"));

    tracing::info!(document_id = document.id, %expires_at, "Share link issued");
    Ok(ApiResponse::ok(ShareLinkResponse { token, url, expires_at }))
}

/// Download a document through a share link, without logging in
#[utoipa::path(
    get,
    path = "/documents/shared/{token}",
    tag = "documents",
    summary = "Download shared document",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 401, description = "Token invalid or expired"),
        (status = 404, description = "Document no longer available"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn download_shared_document(State(state): State<AppState>, Path(token): Path<String>) -> Result<Response> {
    let id = verify_share_token(&token, share_secret(&state)?, Utc::now()).map_err(|e| {
        let message = match e {
            ShareTokenError::Expired => "Share link has expired",
            ShareTokenError::Malformed | ShareTokenError::BadSignature => "Share link is invalid",
        };
        Error::Unauthenticated {
            message: Some(message.to_string()),
        }
    })?;
    let document = load_document(&state, id).await?;
    attachment(&state, &document).await
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{
        add_auth_headers, create_test_app, create_test_department, create_test_employee, create_test_user,
        create_test_user_for_employee,
    };
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn license_form() -> MultipartForm {
        MultipartForm::new()
            .add_text("document_type", "License")
            .add_text("description", "Nursing license")
            .add_part("file", Part::bytes(b"%PDF-1.4 license".to_vec()).file_name("license.pdf"))
    }

    #[sqlx::test]
    async fn test_upload_download_and_delete(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let department = create_test_department(&pool, "Nursing").await;
        let employee = create_test_employee(&pool, "nurse@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&hr);

        let uploaded = server
            .post(&format!("/api/employees/{}/documents", employee.id))
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await;
        uploaded.assert_status(StatusCode::CREATED);
        let body: Value = uploaded.json();
        assert_eq!(body["data"]["content_type"], "application/pdf");
        assert_eq!(body["data"]["size_bytes"], 16);
        assert!(body["data"].get("stored_path").is_none());
        let id = body["data"]["document_id"].as_i64().unwrap();

        let download = server
            .get(&format!("/api/documents/{id}/download"))
            .add_header(&auth.0, &auth.1)
            .await;
        download.assert_status_ok();
        assert_eq!(download.header("content-disposition"), "attachment; filename=\"license.pdf\"");
        assert_eq!(download.as_bytes().as_ref(), b"%PDF-1.4 license");

        let listed: Value = server
            .get(&format!("/api/employees/{}/documents", employee.id))
            .add_header(&auth.0, &auth.1)
            .await
            .json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        server
            .delete(&format!("/api/documents/{id}"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/documents/{id}"))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_download_with_control_characters_in_name(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let department = create_test_department(&pool, "Nursing").await;
        let employee = create_test_employee(&pool, "nurse@hospital.local", department.id).await;
        let server = create_test_app(pool.clone());
        let auth = add_auth_headers(&hr);

        let id = server
            .post(&format!("/api/employees/{}/documents", employee.id))
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await
            .json::<Value>()["data"]["document_id"]
            .as_i64()
            .unwrap();
        sqlx::query("UPDATE employee_documents SET file_name = $1 WHERE id = $2")
            .bind("license\r\nSet-Cookie: x=1\t\"v2\".pdf")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let download = server
            .get(&format!("/api/documents/{id}/download"))
            .add_header(&auth.0, &auth.1)
            .await;
        download.assert_status_ok();
        assert_eq!(
            download.header("content-disposition"),
            "attachment; filename=\"license__Set-Cookie: x=1__v2_.pdf\""
        );
    }

    #[test]
    fn test_attachment_disposition_keeps_unicode() {
        assert_eq!(
            super::attachment_disposition("résumé \\ final.pdf"),
            "attachment; filename=\"résumé _ final.pdf\""
        );
    }

    #[sqlx::test]
    async fn test_upload_requires_file_and_type(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrStaff).await;
        let department = create_test_department(&pool, "Nursing").await;
        let employee = create_test_employee(&pool, "nurse@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&hr);

        let response = server
            .post(&format!("/api/employees/{}/documents", employee.id))
            .add_header(&auth.0, &auth.1)
            .multipart(MultipartForm::new().add_part("file", Part::bytes(Vec::new()).file_name("empty.txt")))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"]["file"].is_string());
        assert!(body["error"]["document_type"].is_string());

        server
            .post("/api/employees/999999/documents")
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_employee_sees_only_own_documents(pool: PgPool) {
        let department = create_test_department(&pool, "Nursing").await;
        let me = create_test_employee(&pool, "me@hospital.local", department.id).await;
        let colleague = create_test_employee(&pool, "colleague@hospital.local", department.id).await;
        let user = create_test_user_for_employee(&pool, Role::Employee, me.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&user);

        server
            .post(&format!("/api/employees/{}/documents", me.id))
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/api/employees/{}/documents", colleague.id))
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get(&format!("/api/employees/{}/documents", colleague.id))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_share_link_downloads_without_login(pool: PgPool) {
        let hr = create_test_user(&pool, Role::HrManager).await;
        let department = create_test_department(&pool, "Nursing").await;
        let employee = create_test_employee(&pool, "nurse@hospital.local", department.id).await;
        let server = create_test_app(pool);
        let auth = add_auth_headers(&hr);

        let id = server
            .post(&format!("/api/employees/{}/documents", employee.id))
            .add_header(&auth.0, &auth.1)
            .multipart(license_form())
            .await
            .json::<Value>()["data"]["document_id"]
            .as_i64()
            .unwrap();

        let shared: Value = server
            .post(&format!("/api/documents/{id}/share"))
            .add_header(&auth.0, &auth.1)
            .json(&json!({"expires_in_minutes": 15}))
            .await
            .json();
        let token = shared["data"]["token"].as_str().unwrap().to_string();
        assert!(shared["data"]["url"].as_str().unwrap().ends_with(&format!("/api/documents/shared/{token}")));

        let download = server.get(&format!("/api/documents/shared/{token}")).await;
        download.assert_status_ok();
        assert_eq!(download.as_bytes().as_ref(), b"%PDF-1.4 license");

        let tampered = format!("{token}A");
        server
            .get(&format!("/api/documents/shared/{tampered}"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/documents/shared/not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
