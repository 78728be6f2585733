//! In-memory graph executor.
//!
//! Node and edge maps with bidirectional adjacency indexes, plus a public-id
//! index. Produces the same raw rows a Cypher `OPTIONAL MATCH` would, so the
//! materializer cannot tell it apart from the real store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::{Direction, Scalar};
use crate::schema::EdgeType;

use super::{GraphExecutor, LinkInstruction, RawEdge, RawNode, RawRow};

#[derive(Debug, Clone)]
struct StoredNode {
    label: EntityLabel,
    /// Includes `id`.
    properties: BTreeMap<String, Scalar>,
}

#[derive(Debug, Clone, Copy)]
struct StoredEdge {
    edge_type: EdgeType,
    source: i64,
    target: i64,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: HashMap<i64, StoredNode>,
    edges: HashMap<i64, StoredEdge>,
    /// source -> edge ids.
    outgoing: HashMap<i64, Vec<i64>>,
    /// target -> edge ids.
    incoming: HashMap<i64, Vec<i64>>,
    by_public_id: HashMap<NodeId, i64>,
    next_node_id: i64,
    next_edge_id: i64,
}

impl GraphState {
    fn lookup(&self, label: EntityLabel, id: &NodeId) -> Option<i64> {
        self.by_public_id
            .get(id)
            .copied()
            .filter(|internal| self.nodes.get(internal).is_some_and(|n| n.label == label))
    }

    fn lookup_or_not_found(&self, label: EntityLabel, id: &NodeId) -> Result<i64> {
        self.lookup(label, id)
            .ok_or_else(|| Error::NotFound(format!("{label}:{id}")))
    }

    fn raw_node(&self, internal_id: i64) -> Option<RawNode> {
        self.nodes.get(&internal_id).map(|node| RawNode {
            internal_id,
            labels: vec![node.label.as_str().to_string()],
            properties: node.properties.clone(),
        })
    }

    fn rows_for(&self, internal_id: i64) -> Vec<RawRow> {
        let Some(subject) = self.raw_node(internal_id) else {
            return Vec::new();
        };

        let mut edge_ids: Vec<i64> = self
            .outgoing
            .get(&internal_id)
            .into_iter()
            .chain(self.incoming.get(&internal_id))
            .flatten()
            .copied()
            .collect();
        edge_ids.sort_unstable();
        edge_ids.dedup();

        let rows: Vec<RawRow> = edge_ids
            .into_iter()
            .filter_map(|edge_id| {
                let edge = self.edges.get(&edge_id)?;
                let other = if edge.source == internal_id {
                    edge.target
                } else {
                    edge.source
                };
                Some(RawRow {
                    subject: subject.clone(),
                    edge: Some(RawEdge {
                        edge_type: edge.edge_type.as_str().to_string(),
                        start: edge.source,
                        end: edge.target,
                    }),
                    neighbor: self.raw_node(other),
                })
            })
            .collect();

        if rows.is_empty() {
            vec![RawRow {
                subject,
                edge: None,
                neighbor: None,
            }]
        } else {
            rows
        }
    }

    fn add_node(&mut self, label: EntityLabel, properties: BTreeMap<String, Scalar>, id: NodeId) -> i64 {
        self.next_node_id += 1;
        let internal_id = self.next_node_id;
        self.nodes.insert(internal_id, StoredNode { label, properties });
        self.by_public_id.insert(id, internal_id);
        internal_id
    }

    fn find_edge(&self, source: i64, target: i64, edge_type: EdgeType) -> Option<i64> {
        self.outgoing.get(&source)?.iter().copied().find(|edge_id| {
            self.edges
                .get(edge_id)
                .is_some_and(|e| e.target == target && e.edge_type == edge_type)
        })
    }

    fn merge_edge(&mut self, source: i64, target: i64, edge_type: EdgeType) {
        if self.find_edge(source, target, edge_type).is_some() {
            return;
        }
        self.next_edge_id += 1;
        let edge_id = self.next_edge_id;
        self.outgoing.entry(source).or_default().push(edge_id);
        self.incoming.entry(target).or_default().push(edge_id);
        self.edges.insert(
            edge_id,
            StoredEdge {
                edge_type,
                source,
                target,
            },
        );
    }

    fn remove_edge(&mut self, edge_id: i64) -> Option<StoredEdge> {
        let edge = self.edges.remove(&edge_id)?;
        if let Some(ids) = self.outgoing.get_mut(&edge.source) {
            ids.retain(|&id| id != edge_id);
        }
        if let Some(ids) = self.incoming.get_mut(&edge.target) {
            ids.retain(|&id| id != edge_id);
        }
        Some(edge)
    }

    /// Removes a node and all its connected edges (cascade delete).
    fn remove_node(&mut self, internal_id: i64) -> Option<StoredNode> {
        let node = self.nodes.remove(&internal_id)?;
        let outgoing_ids = self.outgoing.remove(&internal_id).unwrap_or_default();
        let incoming_ids = self.incoming.remove(&internal_id).unwrap_or_default();
        for edge_id in outgoing_ids.into_iter().chain(incoming_ids) {
            self.remove_edge(edge_id);
        }
        self.by_public_id.retain(|_, &mut internal| internal != internal_id);
        Some(node)
    }

    fn endpoints(subject: i64, neighbor: i64, direction: Direction) -> (i64, i64) {
        match direction {
            Direction::Outbound => (subject, neighbor),
            Direction::Inbound => (neighbor, subject),
        }
    }
}

/// In-process [`GraphExecutor`].
///
/// State lives behind a single `RwLock`; no lock is held across an `.await`.
/// [`InMemoryGraph::set_offline`] makes every call fail with
/// `Error::StoreUnavailable`, for exercising outage paths.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    state: RwLock<GraphState>,
    offline: AtomicBool,
}

impl InMemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a store outage (`true`) or recovery (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Returns the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::StoreUnavailable("in-memory graph is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GraphExecutor for InMemoryGraph {
    async fn fetch_all(&self, label: EntityLabel) -> Result<Vec<RawRow>> {
        self.ensure_online()?;
        let state = self.state.read();
        let mut subjects: Vec<i64> = state
            .nodes
            .iter()
            .filter(|(_, node)| node.label == label)
            .map(|(&internal_id, _)| internal_id)
            .collect();
        subjects.sort_unstable();
        Ok(subjects
            .into_iter()
            .flat_map(|internal_id| state.rows_for(internal_id))
            .collect())
    }

    async fn fetch_one(&self, label: EntityLabel, id: &NodeId) -> Result<Vec<RawRow>> {
        self.ensure_online()?;
        let state = self.state.read();
        let internal_id = state.lookup_or_not_found(label, id)?;
        Ok(state.rows_for(internal_id))
    }

    async fn remove(&self, label: EntityLabel, id: &NodeId) -> Result<u64> {
        self.ensure_online()?;
        let mut state = self.state.write();
        let removed = state
            .lookup(label, id)
            .and_then(|internal_id| state.remove_node(internal_id));
        Ok(u64::from(removed.is_some()))
    }

    async fn merge_attributes(
        &self,
        label: EntityLabel,
        id: &NodeId,
        attributes: &BTreeMap<String, Scalar>,
        is_update: bool,
    ) -> Result<Vec<RawRow>> {
        self.ensure_online()?;
        let mut properties = attributes.clone();
        properties.insert("id".to_string(), Scalar::from(id.as_str()));

        let mut state = self.state.write();
        let internal_id = match state.lookup(label, id) {
            Some(internal_id) => {
                if let Some(node) = state.nodes.get_mut(&internal_id) {
                    node.properties = properties;
                }
                internal_id
            }
            None if is_update => return Err(Error::NotFound(format!("{label}:{id}"))),
            None if state.by_public_id.contains_key(id) => {
                return Err(Error::Internal(format!(
                    "id {id} already belongs to a node with another label"
                )));
            }
            None => state.add_node(label, properties, id.clone()),
        };

        Ok(state
            .raw_node(internal_id)
            .map(|subject| RawRow {
                subject,
                edge: None,
                neighbor: None,
            })
            .into_iter()
            .collect())
    }

    async fn apply_relationship_diff(
        &self,
        label: EntityLabel,
        id: &NodeId,
        removals: &[LinkInstruction],
        additions: &[LinkInstruction],
    ) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write();
        let subject = state.lookup_or_not_found(label, id)?;

        // Resolve every addition first so a missing neighbor applies nothing.
        let resolved_additions = additions
            .iter()
            .map(|link| {
                state
                    .lookup_or_not_found(link.neighbor_label, &link.neighbor_id)
                    .map(|neighbor| (link, neighbor))
            })
            .collect::<Result<Vec<_>>>()?;

        for link in removals {
            let Some(neighbor) = state.lookup(link.neighbor_label, &link.neighbor_id) else {
                continue;
            };
            let (source, target) = GraphState::endpoints(subject, neighbor, link.direction);
            if let Some(edge_id) = state.find_edge(source, target, link.edge_type) {
                state.remove_edge(edge_id);
            }
        }

        for (link, neighbor) in resolved_additions {
            let (source, target) = GraphState::endpoints(subject, neighbor, link.direction);
            state.merge_edge(source, target, link.edge_type);
        }

        Ok(())
    }

    async fn create_edge(
        &self,
        from_id: &NodeId,
        from_label: EntityLabel,
        to_id: &NodeId,
        to_label: EntityLabel,
        edge_type: EdgeType,
    ) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write();
        let source = state.lookup_or_not_found(from_label, from_id)?;
        let target = state.lookup_or_not_found(to_label, to_id)?;
        state.merge_edge(source, target, edge_type);
        Ok(())
    }

    async fn delete_edge(
        &self,
        from_id: &NodeId,
        from_label: EntityLabel,
        to_id: &NodeId,
        to_label: EntityLabel,
        edge_type: EdgeType,
    ) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write();
        let source = state.lookup_or_not_found(from_label, from_id)?;
        let target = state.lookup_or_not_found(to_label, to_id)?;
        let edge_id = state.find_edge(source, target, edge_type).ok_or_else(|| {
            Error::NotFound(format!(
                "{from_label}:{from_id} -[{edge_type}]-> {to_label}:{to_id}"
            ))
        })?;
        state.remove_edge(edge_id);
        Ok(())
    }
}
