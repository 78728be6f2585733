//! Node handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use aettbok_core::Node;

use super::helpers::{store_error, ApiResult};
use crate::AppState;

/// `GET /{label}`.
pub async fn list_nodes(
    State(state): State<Arc<AppState>>,
    Path(label): Path<String>,
) -> ApiResult<Json<Vec<Node>>> {
    state
        .store
        .list_nodes(&label)
        .await
        .map(Json)
        .map_err(|e| store_error("List nodes", &e))
}

/// `POST /{label}`: creates a node with a generated id.
pub async fn insert_node(
    State(state): State<Arc<AppState>>,
    Path(label): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Node>> {
    state
        .store
        .insert_node(&label, &payload)
        .await
        .map(Json)
        .map_err(|e| store_error("Insert node", &e))
}

/// `GET /{label}/{id}`.
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
) -> ApiResult<Json<Node>> {
    state
        .store
        .get_node(&label, &id)
        .await
        .map(Json)
        .map_err(|e| store_error("Get node", &e))
}

/// `POST /{label}/{id}`: updates an existing node.
pub async fn update_node(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Node>> {
    state
        .store
        .upsert_node(&label, &id, &payload, true)
        .await
        .map(Json)
        .map_err(|e| store_error("Update node", &e))
}

/// `DELETE /{label}/{id}`.
pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_node(&label, &id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| store_error("Delete node", &e))
}
