//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Body of `PUT` / `DELETE /{label}/{id}/Relations`: the other endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRequest {
    /// Label of the target node.
    pub label: String,
    /// Id of the target node.
    pub id: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// Server version.
    pub version: String,
}
