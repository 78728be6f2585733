//! Relationship handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use aettbok_core::Relation;

use super::helpers::{store_error, ApiResult};
use crate::types::RelationshipRequest;
use crate::AppState;

/// `GET /{label}/{id}/Relations`.
pub async fn get_relations(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Relation>>> {
    state
        .store
        .get_relations(&label, &id)
        .await
        .map(Json)
        .map_err(|e| store_error("Get relations", &e))
}

/// `PUT /{label}/{id}/Relations`: links the path node to the body node.
pub async fn create_relationship(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
    Json(target): Json<RelationshipRequest>,
) -> ApiResult<StatusCode> {
    state
        .store
        .create_relationship(&label, &id, &target.label, &target.id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| store_error("Create relationship", &e))
}

/// `DELETE /{label}/{id}/Relations`: unlinks the path node from the body node.
pub async fn delete_relationship(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
    Json(target): Json<RelationshipRequest>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_relationship(&label, &id, &target.label, &target.id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| store_error("Delete relationship", &e))
}
