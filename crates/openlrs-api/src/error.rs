//! Error types for the ingest API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that converts
//! into an HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use openlrs_validate::ValidationError;

/// Errors that can occur in the ingest API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A submitted statement failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A statement id collides with one already stored or one earlier in
    /// the same batch.
    #[error("statement id already exists: {0}")]
    DuplicateStatement(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An id in the request path could not be parsed as a UUID.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The request body was structurally unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or unsupported `X-Experience-API-Version` header.
    #[error("unsupported xAPI version: {0}")]
    UnsupportedVersion(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_)
            | Self::InvalidId(_)
            | Self::BadRequest(_)
            | Self::UnsupportedVersion(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateStatement(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
