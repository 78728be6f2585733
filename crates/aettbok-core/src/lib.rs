//! # Aettbok Core
//!
//! Graph entity store for the Aettbok genealogy backend.
//!
//! Genealogical records (people, events, places, documents, sources, tags)
//! live as labeled nodes in a property graph. Callers read and write them as
//! flat records: scalar attributes plus relationship fields holding the ids
//! of linked nodes. The store turns those records into graph operations.
//!
//! ## Features
//!
//! - **Relation schema**: one allowed edge type per ordered label pair; a new
//!   relationship is a table entry
//! - **Relationship diffing**: an upsert computes the minimal edge additions
//!   and removals to reach the desired links
//! - **Cache-aside reads**: per-node and per-label entries with a TTL and
//!   targeted invalidation on write
//! - **Pluggable backends**: in-memory graph and cache out of the box; Neo4j
//!   (`neo4j` feature) and Redis (`redis` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use aettbok_core::{EntityStore, InMemoryCache, InMemoryGraph, NodeCache};
//! use serde_json::json;
//!
//! # async fn run() -> aettbok_core::Result<()> {
//! let store = EntityStore::new(
//!     Arc::new(InMemoryGraph::new()),
//!     NodeCache::new(Arc::new(InMemoryCache::new()), Duration::from_secs(300)),
//! );
//!
//! let ada = store
//!     .insert_node("Person", &json!({"firstname": "Ada", "gender": "f", "alive": false}))
//!     .await?;
//! let people = store.list_nodes("Person").await?;
//! assert_eq!(people[0].id, ada.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::too_many_lines
    )
)]

pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod fields;
pub mod graph;
pub mod ids;
pub mod label;
pub mod materialize;
pub mod model;
pub mod schema;
pub mod store;

pub use cache::{CacheClient, InMemoryCache, NodeCache};
pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use fields::{FieldValidator, SchemaValidator};
pub use graph::{GraphExecutor, InMemoryGraph};
pub use ids::NodeId;
pub use label::EntityLabel;
pub use model::{Direction, Node, Relation, Scalar};
pub use schema::EdgeType;
pub use store::EntityStore;

#[cfg(feature = "redis")]
pub use cache::RedisCache;
#[cfg(feature = "neo4j")]
pub use graph::Neo4jGraph;
