//! HTTP handlers for the Aettbok REST API.
//!
//! - `health`: liveness check
//! - `nodes`: node CRUD per label
//! - `relations`: relationship listing, creation and deletion

pub mod health;
pub mod helpers;
pub mod nodes;
pub mod relations;

pub use health::health_check;
pub use nodes::{delete_node, get_node, insert_node, list_nodes, update_node};
pub use relations::{create_relationship, delete_relationship, get_relations};
