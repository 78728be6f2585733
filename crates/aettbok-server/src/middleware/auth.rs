//! API key authentication middleware.
//!
//! When `AETTBOK_API_KEY` is set, every request except `/health` must carry
//! `Authorization: Bearer <key>` or `X-Api-Key: <key>`.
//!
//! When it is NOT set, authentication is disabled (development mode).

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::types::ErrorResponse;
use crate::AppState;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "AETTBOK_API_KEY";

/// Paths that bypass authentication.
const BYPASS_PATHS: &[&str] = &["/health"];

/// Constant-time byte comparison.
///
/// Does not short-circuit on the first mismatching byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Axum middleware validating the API key against `AppState.api_key`.
///
/// - `api_key` is `None` → dev mode, pass through.
/// - bypass path → pass through.
/// - otherwise the Bearer token or `X-Api-Key` header must match.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    if BYPASS_PATHS.contains(&path) {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match bearer.or(api_key_header) {
        Some(key) if constant_time_eq(key.as_bytes(), expected_key.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => unauthorized("Invalid API key"),
        None => unauthorized(
            "Missing API key. Set Authorization: Bearer <key> or X-Api-Key: <key>",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq_equal() {
        assert!(constant_time_eq(b"secret123", b"secret123"));
    }

    #[test]
    fn test_constant_time_eq_different() {
        assert!(!constant_time_eq(b"secret123", b"secret456"));
    }

    #[test]
    fn test_constant_time_eq_different_lengths() {
        assert!(!constant_time_eq(b"short", b"longer_string"));
    }

    #[test]
    fn test_constant_time_eq_empty() {
        assert!(constant_time_eq(b"", b""));
    }
}
