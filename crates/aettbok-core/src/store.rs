//! Entity store facade.
//!
//! The public surface of the core: parses labels and ids, validates payloads,
//! drives the executor, materializer and diff engine, and keeps the cache
//! coherent. No HTTP vocabulary crosses this boundary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{collection_key, node_key, CacheClient, InMemoryCache, NodeCache};
use crate::config::StoreConfig;
use crate::diff::RelationshipDiff;
use crate::error::{Error, ErrorKind, Result};
use crate::fields::{DesiredLinks, FieldValidator, SchemaValidator};
use crate::graph::{GraphExecutor, InMemoryGraph};
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::materialize::{materialize_many, materialize_one};
use crate::model::{Node, Relation};
use crate::schema::{edge_type_for, relationship_fields};

/// Logs the outcome of a store operation and passes it through.
fn logged<T>(op: &'static str, label: &str, id: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => debug!(op, label, id, "Store operation succeeded"),
        Err(err) => match err.kind() {
            ErrorKind::InvalidArgument
            | ErrorKind::NotFound
            | ErrorKind::RelationshipNotAllowed => {
                warn!(op, label, id, error = %err, "Store operation rejected");
            }
            _ => error!(op, label, id, error = %err, "Store operation failed"),
        },
    }
    result
}

fn neighbor_keys(relations: &[Relation]) -> BTreeSet<String> {
    relations
        .iter()
        .flat_map(|r| {
            [
                collection_key(r.neighbor_label),
                node_key(r.neighbor_label, &r.neighbor_id),
            ]
        })
        .collect()
}

/// Graph entity store with a cache-aside layer.
///
/// Cheap to clone; clones share the executor, cache and validator.
#[derive(Clone)]
pub struct EntityStore {
    graph: Arc<dyn GraphExecutor>,
    cache: NodeCache,
    validator: Arc<dyn FieldValidator>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl EntityStore {
    /// Creates a store validating payloads with [`SchemaValidator`].
    #[must_use]
    pub fn new(graph: Arc<dyn GraphExecutor>, cache: NodeCache) -> Self {
        Self {
            graph,
            cache,
            validator: Arc::new(SchemaValidator),
        }
    }

    /// Replaces the payload validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Builds a store from configuration.
    ///
    /// Uses Neo4j when the `neo4j` feature is enabled and credentials are
    /// configured, and Redis when the `redis` feature is enabled and a URL is
    /// configured. Otherwise falls back to the in-process implementations,
    /// which do not persist anything.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid configuration and the client's
    /// error kind if a configured backend cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let graph = Self::connect_graph(config).await?;
        let cache = if config.cache.enabled {
            NodeCache::new(Self::connect_cache(config).await?, config.ttl())
        } else {
            info!("Node cache disabled");
            NodeCache::disabled()
        };
        Ok(Self::new(graph, cache))
    }

    #[allow(clippy::unused_async)]
    async fn connect_graph(config: &StoreConfig) -> Result<Arc<dyn GraphExecutor>> {
        #[cfg(feature = "neo4j")]
        {
            if let Some((uri, user, password)) = config.neo4j.credentials() {
                let graph = crate::graph::Neo4jGraph::connect(uri, user, password).await?;
                return Ok(Arc::new(graph));
            }
        }
        if config.neo4j.uri.is_some() {
            warn!("Neo4j settings ignored: incomplete credentials or `neo4j` feature disabled");
        }
        warn!("Using in-memory graph: data is NOT persisted");
        Ok(Arc::new(InMemoryGraph::new()))
    }

    #[allow(clippy::unused_async)]
    async fn connect_cache(config: &StoreConfig) -> Result<Arc<dyn CacheClient>> {
        #[cfg(feature = "redis")]
        {
            if let Some(url) = config.cache.redis_url.as_deref() {
                let cache = crate::cache::RedisCache::connect(url).await?;
                return Ok(Arc::new(cache));
            }
        }
        if config.cache.redis_url.is_some() {
            warn!("Redis URL ignored: `redis` feature disabled");
        }
        info!(ttl_secs = config.cache.ttl_secs, "Using in-process node cache");
        Ok(Arc::new(InMemoryCache::new()))
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Lists every node of a label with its relations.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown label, `StoreUnavailable` /
    /// `CacheUnavailable` for client failures, `Internal` for malformed rows.
    pub async fn list_nodes(&self, label: &str) -> Result<Vec<Node>> {
        let result = self.list_nodes_inner(label).await;
        logged("list_nodes", label, "", result)
    }

    async fn list_nodes_inner(&self, label: &str) -> Result<Vec<Node>> {
        let label: EntityLabel = label.parse()?;
        self.cache
            .get_or_load(&collection_key(label), || async move {
                materialize_many(&self.graph.fetch_all(label).await?)
            })
            .await
    }

    /// Returns one node with its relations.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown label or malformed id, `NotFound` if
    /// no such node exists, plus client failures.
    pub async fn get_node(&self, label: &str, id: &str) -> Result<Node> {
        let result = self.get_node_inner(label, id).await;
        logged("get_node", label, id, result)
    }

    async fn get_node_inner(&self, label: &str, id: &str) -> Result<Node> {
        let label: EntityLabel = label.parse()?;
        let id = NodeId::parse(id)?;
        self.cached_node(label, &id).await
    }

    async fn cached_node(&self, label: EntityLabel, id: &NodeId) -> Result<Node> {
        self.cache
            .get_or_load(&node_key(label, id), || async move {
                materialize_one(&self.graph.fetch_one(label, id).await?)
            })
            .await
    }

    /// Returns the relations of one node.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::get_node`].
    pub async fn get_relations(&self, label: &str, id: &str) -> Result<Vec<Relation>> {
        let result = self
            .get_node_inner(label, id)
            .await
            .map(|node| node.relations);
        logged("get_relations", label, id, result)
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Deletes a node and every edge touching it.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing was removed, plus parse and client failures.
    pub async fn delete_node(&self, label: &str, id: &str) -> Result<()> {
        let result = self.delete_node_inner(label, id).await;
        logged("delete_node", label, id, result)
    }

    async fn delete_node_inner(&self, label: &str, id: &str) -> Result<()> {
        let label: EntityLabel = label.parse()?;
        let id = NodeId::parse(id)?;

        // Neighbors lose a relation too; remember them before the edges go.
        let neighbors = materialize_one(&self.graph.fetch_one(label, &id).await?)?.relations;

        if self.graph.remove(label, &id).await? == 0 {
            return Err(Error::NotFound(format!("{label}:{id}")));
        }

        let mut keys = neighbor_keys(&neighbors);
        keys.insert(collection_key(label));
        keys.insert(node_key(label, &id));
        self.cache.invalidate_all(keys).await
    }

    /// Creates a node with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::upsert_node`].
    pub async fn insert_node(&self, label: &str, payload: &Value) -> Result<Node> {
        let id = NodeId::generate();
        let result = self.upsert_node_inner(label, id.as_str(), payload, false).await;
        logged("insert_node", label, id.as_str(), result)
    }

    /// Writes a node's attributes and reconciles its relationship fields.
    ///
    /// With `is_update` the node must already exist. Relationship fields
    /// absent from `payload` clear their links.
    ///
    /// Attributes and relationships are written in two store calls; if the
    /// second fails, the new attributes remain.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed label, id or payload; `NotFound` for
    /// a missing node (update) or missing linked node; plus client failures.
    pub async fn upsert_node(
        &self,
        label: &str,
        id: &str,
        payload: &Value,
        is_update: bool,
    ) -> Result<Node> {
        let result = self.upsert_node_inner(label, id, payload, is_update).await;
        logged("upsert_node", label, id, result)
    }

    async fn upsert_node_inner(
        &self,
        label: &str,
        id: &str,
        payload: &Value,
        is_update: bool,
    ) -> Result<Node> {
        let label: EntityLabel = label.parse()?;
        let id = NodeId::parse(id)?;
        let payload = self.validator.validate(label, &id, payload)?;

        self.graph
            .merge_attributes(label, &id, &payload.attributes, is_update)
            .await?;

        let subject_keys = [collection_key(label), node_key(label, &id)];
        let (diff, node) = match self.reconcile_relations(label, &id, &payload.relations).await {
            Ok(reconciled) => reconciled,
            Err(err) => {
                // Attributes already changed; don't serve the old ones.
                if let Err(cache_err) = self.cache.invalidate_all(subject_keys).await {
                    warn!(%label, %id, error = %cache_err, "Invalidation after failed upsert failed");
                }
                return Err(err);
            }
        };

        let mut keys: BTreeSet<String> = subject_keys.into_iter().collect();
        for (neighbor_label, neighbor_id) in diff.touched() {
            keys.insert(collection_key(neighbor_label));
            keys.insert(node_key(neighbor_label, &neighbor_id));
        }
        self.cache.invalidate_all(keys).await?;

        debug!(
            %label, %id,
            removed = diff.removals.len(),
            added = diff.additions.len(),
            "Upserted node"
        );
        Ok(node)
    }

    async fn reconcile_relations(
        &self,
        label: EntityLabel,
        id: &NodeId,
        desired: &BTreeMap<&'static str, DesiredLinks>,
    ) -> Result<(RelationshipDiff, Node)> {
        let current = materialize_one(&self.graph.fetch_one(label, id).await?)?;
        let diff = RelationshipDiff::compute(relationship_fields(label), &current.relations, desired);

        if diff.is_empty() {
            return Ok((diff, current));
        }

        self.graph
            .apply_relationship_diff(label, id, &diff.removals, &diff.additions)
            .await?;
        let node = materialize_one(&self.graph.fetch_one(label, id).await?)?;
        Ok((diff, node))
    }

    /// Creates the schema-defined edge from one node to another.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a self relation, `RelationshipNotAllowed` for an
    /// unregistered label pair (no store call is made), `NotFound` if either
    /// node is missing, plus client failures.
    pub async fn create_relationship(
        &self,
        from_label: &str,
        from_id: &str,
        to_label: &str,
        to_id: &str,
    ) -> Result<()> {
        let result = self
            .relationship(from_label, from_id, to_label, to_id, true)
            .await;
        logged("create_relationship", from_label, from_id, result)
    }

    /// Deletes the schema-defined edge from one node to another.
    ///
    /// # Errors
    ///
    /// As [`EntityStore::create_relationship`]; `NotFound` also when the edge
    /// does not exist.
    pub async fn delete_relationship(
        &self,
        from_label: &str,
        from_id: &str,
        to_label: &str,
        to_id: &str,
    ) -> Result<()> {
        let result = self
            .relationship(from_label, from_id, to_label, to_id, false)
            .await;
        logged("delete_relationship", from_label, from_id, result)
    }

    async fn relationship(
        &self,
        from_label: &str,
        from_id: &str,
        to_label: &str,
        to_id: &str,
        create: bool,
    ) -> Result<()> {
        let from_label: EntityLabel = from_label.parse()?;
        let from_id = NodeId::parse(from_id)?;
        let to_label: EntityLabel = to_label.parse()?;
        let to_id = NodeId::parse(to_id)?;

        if from_id == to_id {
            return Err(Error::InvalidArgument(format!(
                "{from_label}:{from_id} cannot relate to itself"
            )));
        }
        let edge_type = edge_type_for(from_label, to_label).ok_or(Error::RelationshipNotAllowed {
            from: from_label,
            to: to_label,
        })?;

        if create {
            self.graph
                .create_edge(&from_id, from_label, &to_id, to_label, edge_type)
                .await?;
        } else {
            self.graph
                .delete_edge(&from_id, from_label, &to_id, to_label, edge_type)
                .await?;
        }

        self.cache
            .invalidate_all([
                collection_key(from_label),
                node_key(from_label, &from_id),
                collection_key(to_label),
                node_key(to_label, &to_id),
            ])
            .await
    }
}
