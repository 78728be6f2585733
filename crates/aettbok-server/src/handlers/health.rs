//! Health check handler.

use axum::Json;

use crate::types::HealthResponse;

/// `GET /health`. Never touches the store or cache.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
