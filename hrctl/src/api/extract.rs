//! Extractors whose rejections render as the standard error envelope.
//!
//! axum's own `Json`, `Query` and `Path` reject with plain-text bodies; these wrappers map
//! every rejection onto [`Error::BadRequest`] so malformed input gets the same JSON shape as
//! every other failure.

use axum::{
    Json,
    body::Bytes,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};

use serde::de::DeserializeOwned;

use crate::errors::Error;
use crate::types::parse_positive_id;

/// JSON request body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(Error::BadRequest {
                message: json_rejection_message(&rejection),
            }),
        }
    }
}

fn json_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid request body: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".to_string(),
        JsonRejection::MissingJsonContentType(_) => "Content-Type must be application/json".to_string(),
        _ => "Failed to read request body".to_string(),
    }
}

/// JSON body that may be omitted entirely, as on status-change actions.
///
/// An empty body yields `T::default()`; a present body must be valid JSON for `T`. No
/// content type is required.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|_| Error::BadRequest {
            message: "Failed to read request body".to_string(),
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        serde_json::from_slice(&bytes).map(OptionalJson).map_err(|e| Error::BadRequest {
            message: format!("Invalid request body: {e}"),
        })
    }
}

/// Query string parameters
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(Error::BadRequest {
                message: format!("Invalid query string: {}", rejection.body_text()),
            }),
        }
    }
}

/// The single `{id}` segment of a route, which must be a positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| Error::BadRequest {
                message: format!("Invalid path: {}", rejection.body_text()),
            })?;

        parse_positive_id(&raw)
            .map(EntityId)
            .ok_or_else(|| Error::BadRequest {
                message: format!("Invalid id '{}': expected a positive integer", raw.as_str()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Filter {
        status: Option<String>,
    }

    async fn show(EntityId(id): EntityId) -> String {
        id.to_string()
    }

    async fn echo(ApiJson(body): ApiJson<serde_json::Value>) -> String {
        body.to_string()
    }

    async fn filter(ApiQuery(filter): ApiQuery<Filter>) -> String {
        filter.status.unwrap_or_default()
    }

    #[derive(Debug, Default, Deserialize)]
    struct Note {
        comment: Option<String>,
    }

    async fn note(OptionalJson(note): OptionalJson<Note>) -> String {
        note.comment.unwrap_or_else(|| "-".to_string())
    }

    fn router() -> Router {
        Router::new()
            .route("/things/{id}", get(show))
            .route("/echo", axum::routing::post(echo))
            .route("/filter", get(filter))
            .route("/note", axum::routing::put(note))
    }

    async fn call(request: axum::http::Request<Body>) -> (StatusCode, String) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_positive_id_accepted() {
        let (status, body) = call(axum::http::Request::get("/things/12").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "12");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request_envelope() {
        for path in ["/things/abc", "/things/0", "/things/-1"] {
            let (status, body) = call(axum::http::Request::get(path).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "bad_request");
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request_envelope() {
        let request = axum::http::Request::post("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["message"], "Malformed JSON in request body");
    }

    #[tokio::test]
    async fn test_query_parsing() {
        let (status, body) = call(axum::http::Request::get("/filter?status=Pending").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Pending");
    }

    #[tokio::test]
    async fn test_optional_body() {
        let (status, body) = call(axum::http::Request::put("/note").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "-");

        let request = axum::http::Request::put("/note").body(Body::from(r#"{"comment":"checked"}"#)).unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "checked");

        let (status, _) = call(axum::http::Request::put("/note").body(Body::from("[")).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
