//! Neo4j-backed graph executor over `neo4rs`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{query, BoltType, Graph, Query, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::Scalar;
use crate::schema::EdgeType;

use super::cypher::{self, Param, Statement, AFFECTED, EDGE, NEIGHBOR, SUBJECT};
use super::{GraphExecutor, LinkInstruction, RawEdge, RawNode, RawRow};

/// [`GraphExecutor`] against a Neo4j server.
///
/// `neo4rs::Graph` pools its connections; each call checks one out and
/// returns it when the call completes, on success or failure.
#[derive(Clone)]
pub struct Neo4jGraph {
    graph: Arc<Graph>,
}

impl std::fmt::Debug for Neo4jGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraph").finish_non_exhaustive()
    }
}

fn store_error(err: neo4rs::Error) -> Error {
    Error::StoreUnavailable(err.to_string())
}

fn decode_error(err: neo4rs::DeError) -> Error {
    Error::Internal(format!("undecodable graph result: {err}"))
}

fn to_bolt(value: &Scalar) -> BoltType {
    match value {
        Scalar::Bool(b) => BoltType::from(*b),
        Scalar::Number(n) => match n.as_i64() {
            Some(int) => BoltType::from(int),
            None => BoltType::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Scalar::String(s) => BoltType::from(s.clone()),
    }
}

fn to_query(statement: Statement) -> Query {
    statement
        .params
        .into_iter()
        .fold(query(&statement.text), |q, (name, param)| match param {
            Param::Text(text) => q.param(name, text),
            Param::Properties(props) => {
                let map: HashMap<String, BoltType> =
                    props.iter().map(|(k, v)| (k.clone(), to_bolt(v))).collect();
                q.param(name, map)
            }
        })
}

fn raw_node(node: &neo4rs::Node) -> Result<RawNode> {
    let mut properties = BTreeMap::new();
    for key in node.keys() {
        let value: serde_json::Value = node.get(key).map_err(decode_error)?;
        // Non-scalar properties are not part of the entity model.
        if let Some(scalar) = Scalar::from_json(&value) {
            properties.insert(key.to_string(), scalar);
        }
    }
    Ok(RawNode {
        internal_id: node.id(),
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    })
}

fn raw_row(row: &Row) -> Result<RawRow> {
    let subject: neo4rs::Node = row.get(SUBJECT).map_err(decode_error)?;
    let edge: Option<neo4rs::Relation> = row.get(EDGE).map_err(decode_error)?;
    let neighbor: Option<neo4rs::Node> = row.get(NEIGHBOR).map_err(decode_error)?;
    Ok(RawRow {
        subject: raw_node(&subject)?,
        edge: edge.map(|r| RawEdge {
            edge_type: r.typ().to_string(),
            start: r.start_node_id(),
            end: r.end_node_id(),
        }),
        neighbor: neighbor.as_ref().map(raw_node).transpose()?,
    })
}

impl Neo4jGraph {
    /// Connects to a Neo4j server.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable` if the connection pool cannot be
    /// established.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await.map_err(store_error)?;
        info!(uri, "Connected to Neo4j");
        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    async fn rows(&self, statement: Statement) -> Result<Vec<Row>> {
        debug!(cypher = %statement.text, "Executing statement");
        let mut stream = self
            .graph
            .execute(to_query(statement))
            .await
            .map_err(store_error)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(store_error)? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn affected(&self, statement: Statement) -> Result<i64> {
        let rows = self.rows(statement).await?;
        match rows.first() {
            Some(row) => row.get::<i64>(AFFECTED).map_err(decode_error),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl GraphExecutor for Neo4jGraph {
    async fn fetch_all(&self, label: EntityLabel) -> Result<Vec<RawRow>> {
        self.rows(cypher::fetch_all(label))
            .await?
            .iter()
            .map(raw_row)
            .collect()
    }

    async fn fetch_one(&self, label: EntityLabel, id: &NodeId) -> Result<Vec<RawRow>> {
        let rows: Vec<RawRow> = self
            .rows(cypher::fetch_one(label, id))
            .await?
            .iter()
            .map(raw_row)
            .collect::<Result<_>>()?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!("{label}:{id}")));
        }
        Ok(rows)
    }

    async fn remove(&self, label: EntityLabel, id: &NodeId) -> Result<u64> {
        let affected = self.affected(cypher::remove(label, id)).await?;
        Ok(u64::try_from(affected).unwrap_or(0))
    }

    async fn merge_attributes(
        &self,
        label: EntityLabel,
        id: &NodeId,
        attributes: &BTreeMap<String, Scalar>,
        is_update: bool,
    ) -> Result<Vec<RawRow>> {
        let rows = self
            .rows(cypher::merge_attributes(label, id, attributes, is_update))
            .await?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!("{label}:{id}")));
        }
        rows.iter()
            .map(|row| {
                let subject: neo4rs::Node = row.get(SUBJECT).map_err(decode_error)?;
                Ok(RawRow {
                    subject: raw_node(&subject)?,
                    edge: None,
                    neighbor: None,
                })
            })
            .collect()
    }

    async fn apply_relationship_diff(
        &self,
        label: EntityLabel,
        id: &NodeId,
        removals: &[LinkInstruction],
        additions: &[LinkInstruction],
    ) -> Result<()> {
        if removals.is_empty() && additions.is_empty() {
            return Ok(());
        }

        let mut txn = self.graph.start_txn().await.map_err(store_error)?;

        for link in removals {
            txn.run(to_query(cypher::unlink(label, id, link)))
                .await
                .map_err(store_error)?;
        }

        for link in additions {
            let mut stream = txn
                .execute(to_query(cypher::link(label, id, link)))
                .await
                .map_err(store_error)?;
            let mut affected = 0_i64;
            while let Some(row) = stream.next(txn.handle()).await.map_err(store_error)? {
                affected += row.get::<i64>(AFFECTED).map_err(decode_error)?;
            }
            if affected == 0 {
                txn.rollback().await.map_err(store_error)?;
                return Err(Error::NotFound(format!(
                    "{}:{} linked from {label}:{id}",
                    link.neighbor_label, link.neighbor_id
                )));
            }
        }

        txn.commit().await.map_err(store_error)?;
        debug!(
            %label, %id,
            removed = removals.len(),
            added = additions.len(),
            "Applied relationship diff"
        );
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
        let affected = self
            .affected(cypher::create_edge(from_id, from_label, to_id, to_label, edge_type))
            .await?;
        if affected == 0 {
            return Err(Error::NotFound(format!(
                "{from_label}:{from_id} or {to_label}:{to_id}"
            )));
        }
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
        let affected = self
            .affected(cypher::delete_edge(from_id, from_label, to_id, to_label, edge_type))
            .await?;
        if affected == 0 {
            return Err(Error::NotFound(format!(
                "{from_label}:{from_id} -[{edge_type}]-> {to_label}:{to_id}"
            )));
        }
        Ok(())
    }
}
