//! Graph query executor.
//!
//! [`GraphExecutor`] is the seam between the entity store and the graph
//! database: one operation per use case, each returning raw rows in the shape
//! of `MATCH (n1) OPTIONAL MATCH (n1)-[r]-(n2) RETURN n1, r, n2`. Rows still
//! carry the store's internal node identities; the materializer resolves
//! edge direction from them and drops them.
//!
//! Implementations:
//! - [`InMemoryGraph`]: adjacency-indexed in-process graph (tests, dev mode).
//! - `Neo4jGraph` (feature `neo4j`): parameterized Cypher over `neo4rs`.

pub mod cypher;
mod memory;
#[cfg(feature = "neo4j")]
mod neo4j;

#[cfg(test)]
mod memory_tests;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::{Direction, Scalar};
use crate::schema::EdgeType;

pub use memory::InMemoryGraph;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraph;

/// A node as returned by the store, before materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    /// Store-internal identity, meaningful only within one result set.
    pub internal_id: i64,
    /// Labels carried by the node.
    pub labels: Vec<String>,
    /// All stored properties, including `id`.
    pub properties: BTreeMap<String, Scalar>,
}

/// An edge as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    /// Relationship type text.
    pub edge_type: String,
    /// Internal identity of the start node.
    pub start: i64,
    /// Internal identity of the end node.
    pub end: i64,
}

/// One result row: a subject node, optionally with one adjacent edge and the
/// node at its other end.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// The node that was matched by label (and id).
    pub subject: RawNode,
    /// Adjacent edge, absent when the subject has no edges.
    pub edge: Option<RawEdge>,
    /// Node at the other end of `edge`.
    pub neighbor: Option<RawNode>,
}

/// One edge to create or delete, relative to a subject node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkInstruction {
    /// Edge type.
    pub edge_type: EdgeType,
    /// Label of the node at the other end.
    pub neighbor_label: EntityLabel,
    /// Public id of the node at the other end.
    pub neighbor_id: NodeId,
    /// `Outbound`: subject -> neighbor. `Inbound`: neighbor -> subject.
    pub direction: Direction,
}

/// Read/write operations against the graph store.
///
/// Every call runs in its own store scope, released when the call completes.
/// Client failures surface as `Error::StoreUnavailable`, undecodable results
/// as `Error::Internal`.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// All nodes with `label`, outer-joined with their adjacent edges.
    async fn fetch_all(&self, label: EntityLabel) -> Result<Vec<RawRow>>;

    /// The node `label:id`, outer-joined with its adjacent edges.
    ///
    /// Returns `Error::NotFound` if no node matched.
    async fn fetch_one(&self, label: EntityLabel, id: &NodeId) -> Result<Vec<RawRow>>;

    /// Deletes the node and every edge touching it; returns the number of
    /// nodes removed (0 or 1).
    async fn remove(&self, label: EntityLabel, id: &NodeId) -> Result<u64>;

    /// Replaces the node's stored attributes with `attributes` plus `id`.
    ///
    /// With `is_update` the node must exist (`Error::NotFound` otherwise);
    /// without it the node is created if absent. Returns the subject row
    /// without edges.
    async fn merge_attributes(
        &self,
        label: EntityLabel,
        id: &NodeId,
        attributes: &BTreeMap<String, Scalar>,
        is_update: bool,
    ) -> Result<Vec<RawRow>>;

    /// Deletes each edge in `removals` if present and creates each edge in
    /// `additions` if absent.
    ///
    /// Returns `Error::NotFound` if the subject or an addition's neighbor
    /// does not exist; nothing is applied in that case.
    async fn apply_relationship_diff(
        &self,
        label: EntityLabel,
        id: &NodeId,
        removals: &[LinkInstruction],
        additions: &[LinkInstruction],
    ) -> Result<()>;

    /// Creates `from -[edge_type]-> to` if absent.
    ///
    /// Returns `Error::NotFound` if either endpoint does not exist.
    async fn create_edge(
        &self,
        from_id: &NodeId,
        from_label: EntityLabel,
        to_id: &NodeId,
        to_label: EntityLabel,
        edge_type: EdgeType,
    ) -> Result<()>;

    /// Deletes `from -[edge_type]-> to`.
    ///
    /// Returns `Error::NotFound` if the edge or either endpoint does not exist.
    async fn delete_edge(
        &self,
        from_id: &NodeId,
        from_label: EntityLabel,
        to_id: &NodeId,
        to_label: EntityLabel,
        edge_type: EdgeType,
    ) -> Result<()>;
}
