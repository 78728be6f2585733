//! Aettbok Server - REST API for the Aettbok graph entity store.
//!
//! Exposes every entity label as a JSON collection:
//!
//! | method | path                      | operation                 |
//! |--------|---------------------------|---------------------------|
//! | GET    | `/{label}`                | list nodes                |
//! | POST   | `/{label}`                | insert node (new id)      |
//! | GET    | `/{label}/{id}`           | get node                  |
//! | POST   | `/{label}/{id}`           | update node               |
//! | DELETE | `/{label}/{id}`           | delete node               |
//! | GET    | `/{label}/{id}/Relations` | list relations            |
//! | PUT    | `/{label}/{id}/Relations` | create relationship       |
//! | DELETE | `/{label}/{id}/Relations` | delete relationship       |

#![allow(clippy::doc_markdown)]

use std::sync::Arc;

use axum::{routing::get, Router};

use aettbok_core::EntityStore;

pub mod handlers;
pub mod middleware;
pub mod types;

pub use handlers::{
    create_relationship, delete_node, delete_relationship, get_node, get_relations, health_check,
    insert_node, list_nodes, update_node,
};
pub use middleware::auth::{auth_middleware, API_KEY_ENV};
pub use types::{ErrorResponse, RelationshipRequest};

/// Shared application state.
pub struct AppState {
    /// The entity store.
    pub store: EntityStore,
    /// Expected API key; `None` disables authentication.
    pub api_key: Option<String>,
}

/// Builds the API router with authentication applied.
///
/// CORS, compression and tracing layers are added by the binary.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/{label}", get(list_nodes).post(insert_node))
        .route(
            "/{label}/{id}",
            get(get_node).post(update_node).delete(delete_node),
        )
        .route(
            "/{label}/{id}/Relations",
            get(get_relations)
                .put(create_relationship)
                .delete(delete_relationship),
        )
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}
