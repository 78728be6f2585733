//! Materialized node and relation types.
//!
//! These are the public representations handed to callers and stored in the
//! cache. They carry public ids only; the graph store's internal identities
//! never appear here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::schema::EdgeType;

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean attribute.
    Bool(bool),
    /// Numeric attribute. Integers stay integers.
    Number(Number),
    /// String attribute.
    String(String),
}

impl Scalar {
    /// Converts a JSON value into a scalar, if it is one.
    ///
    /// Returns `None` for `null`, arrays and objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Direction of a relation relative to the node that owns the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The owning node is the edge's start.
    Outbound,
    /// The owning node is the edge's end.
    Inbound,
}

/// One edge as seen from one of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    /// Edge type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Label of the node at the other end.
    #[serde(rename = "relationLabel")]
    pub neighbor_label: EntityLabel,
    /// Public id of the node at the other end.
    #[serde(rename = "relationId")]
    pub neighbor_id: NodeId,
    /// Direction relative to the owning node.
    pub direction: Direction,
}

/// A node together with its scalar attributes and relations.
///
/// Serializes as `{"label", "id", ...attributes, "relations"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Entity label, fixed at creation.
    pub label: EntityLabel,
    /// Public id, fixed at creation.
    pub id: NodeId,
    /// Label-declared scalar attributes.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Scalar>,
    /// Deduplicated relations, order irrelevant.
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Node {
    /// Creates a node without attributes or relations.
    #[must_use]
    pub fn new(label: EntityLabel, id: NodeId) -> Self {
        Self {
            label,
            id,
            attributes: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    /// Sets the attributes (builder pattern).
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Scalar>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns a specific attribute value, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Scalar> {
        self.attributes.get(name)
    }

    /// Returns the relations of one edge type in one direction.
    pub fn relations_of(
        &self,
        edge_type: EdgeType,
        direction: Direction,
    ) -> impl Iterator<Item = &Relation> + '_ {
        self.relations
            .iter()
            .filter(move |r| r.edge_type == edge_type && r.direction == direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ada() -> Node {
        let mut attributes = BTreeMap::new();
        attributes.insert("firstname".to_string(), Scalar::from("Ada"));
        attributes.insert("alive".to_string(), Scalar::from(false));
        let mut node = Node::new(
            EntityLabel::Person,
            NodeId::parse("aBcDeFgHiJkLmNoPqRsTuV").unwrap(),
        )
        .with_attributes(attributes);
        node.relations.push(Relation {
            edge_type: EdgeType::HasParent,
            neighbor_label: EntityLabel::Person,
            neighbor_id: NodeId::parse("xYzxYzxYzxYzxYzxYzxYz1").unwrap(),
            direction: Direction::Outbound,
        });
        node
    }

    #[test]
    fn test_node_json_shape() {
        let value = serde_json::to_value(ada()).unwrap();
        assert_eq!(
            value,
            json!({
                "label": "Person",
                "id": "aBcDeFgHiJkLmNoPqRsTuV",
                "firstname": "Ada",
                "alive": false,
                "relations": [{
                    "type": "HASPARENT",
                    "relationLabel": "Person",
                    "relationId": "xYzxYzxYzxYzxYzxYzxYz1",
                    "direction": "outbound"
                }]
            })
        );
    }

    #[test]
    fn test_node_json_roundtrip_keeps_attributes() {
        let node = ada();
        let text = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_scalar_from_json() {
        assert_eq!(Scalar::from_json(&json!(3)), Some(Scalar::from(3)));
        assert_eq!(Scalar::from_json(&json!("x")), Some(Scalar::from("x")));
        assert_eq!(Scalar::from_json(&json!(null)), None);
        assert_eq!(Scalar::from_json(&json!([1])), None);
    }

    #[test]
    fn test_numbers_keep_their_json_form() {
        let year = Scalar::from_json(&json!(1850)).unwrap();
        let latitude = Scalar::from_json(&json!(59.91)).unwrap();
        assert_eq!(serde_json::to_string(&year).unwrap(), "1850");
        assert_eq!(serde_json::to_string(&latitude).unwrap(), "59.91");

        let back: Scalar = serde_json::from_str("1850").unwrap();
        assert_eq!(back, year);
    }
}
