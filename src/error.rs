//! The closed error taxonomy for the API surface.
//!
//! Each variant maps to its own HTTP status so callers can tell retryable
//! failures (upstream hiccups) from non-retryable ones (bad input, missing
//! credentials). Validation and Configuration errors are always raised
//! before any outbound network call.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::protocol::ErrorBody;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, malformed, or out-of-range request input; unknown skill id.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A required credential or config value is absent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream service responded with a non-success status or the
    /// request never completed.
    #[error("upstream service error: {0}")]
    Service(String),

    /// The upstream payload could not be interpreted as the expected
    /// structure, or failed schema validation after parsing.
    #[error("unusable upstream response: {0}")]
    Parsing(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid request"),
            AppError::Configuration(_) => (StatusCode::SERVICE_UNAVAILABLE, "service not configured"),
            AppError::Service(_) => (StatusCode::BAD_GATEWAY, "upstream service error"),
            AppError::Parsing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unusable upstream response"),
        };
        let details = match self {
            AppError::Validation(m)
            | AppError::Configuration(m)
            | AppError::Service(m)
            | AppError::Parsing(m) => m,
        };
        let body = ErrorBody {
            error: label.to_string(),
            details: Some(details),
        };
        (status, Json(body)).into_response()
    }
}
