//! xAPI version negotiation.
//!
//! Protocol routes demand a supported `X-Experience-API-Version` on the
//! way in, and every response carries the server's version on the way
//! out, protocol route or not.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// The xAPI version this LRS speaks.
pub const XAPI_VERSION: &str = "1.0.3";

/// Header carrying the xAPI version on requests and responses.
pub const VERSION_HEADER: &str = "X-Experience-API-Version";

/// Reject protocol requests without a supported version header.
pub async fn require_version(request: Request, next: Next) -> Response {
    let version = request
        .headers()
        .get(VERSION_HEADER)
        .and_then(|value| value.to_str().ok());
    match version {
        Some(version) if version_is_supported(version) => next.run(request).await,
        Some(version) => ApiError::UnsupportedVersion(version.to_owned()).into_response(),
        None => ApiError::UnsupportedVersion("header missing".to_owned()).into_response(),
    }
}

/// Stamp the version header onto every response.
pub async fn stamp_version(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(VERSION_HEADER, HeaderValue::from_static(XAPI_VERSION));
    response
}

/// Whether a client-sent version is one this LRS accepts.
fn version_is_supported(version: &str) -> bool {
    version == "1.0" || version.starts_with("1.0.")
}
