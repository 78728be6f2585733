//! Shared handler helpers.
//!
//! Maps core errors onto HTTP responses so every handler reports failures
//! the same way.

use axum::{http::StatusCode, Json};

use aettbok_core::{Error, ErrorKind};

use crate::types::ErrorResponse;

/// Handler error: status code plus JSON error body.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP status for an error kind.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RelationshipNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::StoreUnavailable | ErrorKind::CacheUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Internal | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts a core error into a response.
///
/// Internal failures go through [`internal_error`]; everything else carries
/// the error message.
pub fn store_error(context: &str, err: &Error) -> ApiError {
    let status = status_for(err.kind());
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return internal_error(context, err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Build an internal server error response without leaking implementation details.
///
/// Logs the full error server-side via `tracing::error!` and returns a generic
/// message to the client.
pub fn internal_error(context: &str, err: &dyn std::fmt::Display) -> ApiError {
    tracing::error!(%context, error = %err, "Internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{context}: internal error"),
        }),
    )
}
