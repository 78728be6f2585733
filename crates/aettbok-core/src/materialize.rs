//! Result materializer.
//!
//! Collapses outer-joined raw rows into [`Node`]s. Rows are grouped by the
//! subject's public id in first-seen order, relations are deduplicated, and
//! direction is resolved from the edge's start endpoint. Internal ids are
//! consumed here and never appear in the output.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::error::{Error, Result};
use crate::graph::{RawNode, RawRow};
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::{Direction, Node, Relation};
use crate::schema::EdgeType;

/// Property keys that never become attributes.
const RESERVED_KEYS: [&str; 3] = ["id", "label", "relations"];

fn public_id(node: &RawNode) -> Result<NodeId> {
    let text = node
        .properties
        .get("id")
        .and_then(|value| value.as_str())
        .ok_or_else(|| {
            Error::Internal(format!(
                "graph node {} has no string id property",
                node.internal_id
            ))
        })?;
    NodeId::parse(text)
        .map_err(|_| Error::Internal(format!("graph node carries malformed id '{text}'")))
}

fn known_label(node: &RawNode) -> Option<EntityLabel> {
    node.labels.iter().find_map(|l| l.parse::<EntityLabel>().ok())
}

fn subject_node(raw: &RawNode) -> Result<Node> {
    let label = known_label(raw).ok_or_else(|| {
        Error::Internal(format!("graph node carries no known label: {:?}", raw.labels))
    })?;
    let id = public_id(raw)?;
    let attributes = raw
        .properties
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(Node::new(label, id).with_attributes(attributes))
}

fn relation(row: &RawRow) -> Option<Relation> {
    let edge = row.edge.as_ref()?;
    let neighbor = row.neighbor.as_ref()?;

    let Ok(edge_type) = edge.edge_type.parse::<EdgeType>() else {
        warn!(edge_type = %edge.edge_type, "Skipping edge of unknown type");
        return None;
    };
    let Some(neighbor_label) = known_label(neighbor) else {
        warn!(labels = ?neighbor.labels, "Skipping neighbor with unknown label");
        return None;
    };
    let neighbor_id = match public_id(neighbor) {
        Ok(id) => id,
        Err(err) => {
            warn!(error = %err, "Skipping neighbor without usable id");
            return None;
        }
    };

    let direction = if edge.start == row.subject.internal_id {
        Direction::Outbound
    } else {
        Direction::Inbound
    };

    Some(Relation {
        edge_type,
        neighbor_label,
        neighbor_id,
        direction,
    })
}

/// Materializes rows into nodes, one per distinct subject, in first-seen
/// order.
///
/// # Errors
///
/// Returns `Error::Internal` when a subject lacks a string id or a known
/// label.
pub fn materialize_many(rows: &[RawRow]) -> Result<Vec<Node>> {
    let mut order: Vec<NodeId> = Vec::new();
    let mut groups: HashMap<NodeId, (Node, BTreeSet<Relation>)> = HashMap::new();

    for row in rows {
        let id = public_id(&row.subject)?;
        if !groups.contains_key(&id) {
            groups.insert(id.clone(), (subject_node(&row.subject)?, BTreeSet::new()));
            order.push(id.clone());
        }
        if let (Some(relation), Some((_, relations))) = (relation(row), groups.get_mut(&id)) {
            relations.insert(relation);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(|(mut node, relations)| {
            node.relations = relations.into_iter().collect();
            node
        })
        .collect())
}

/// Materializes rows that describe a single node.
///
/// # Errors
///
/// Returns `Error::NotFound` for an empty row set and `Error::Internal` for
/// malformed rows.
pub fn materialize_one(rows: &[RawRow]) -> Result<Node> {
    materialize_many(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound("no node in result".to_string()))
}
