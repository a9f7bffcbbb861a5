//! Success half of the response envelope.
//!
//! Handlers return `Result<ApiResponse<T>>`; the error half lives in [`crate::errors`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// `{"success": true, "message"?: ..., "data"?: ...}` with a chosen status code
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: Option<String>,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            data: Some(data),
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl ApiResponse<()> {
    /// Envelope with a message and no data, e.g. for logout
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": true });
        if let Some(message) = self.message {
            body["message"] = json!(message);
        }
        if let Some(data) = self.data {
            match serde_json::to_value(data) {
                Ok(value) => body["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response body: {e}");
                    return crate::errors::Error::Internal {
                        operation: "serialize response".to_string(),
                    }
                    .into_response();
                }
            }
        }
        (self.status, Json(body)).into_response()
    }
}
