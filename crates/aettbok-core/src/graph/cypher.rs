//! Parameterized Cypher statements.
//!
//! Labels and edge types are interpolated from allow-listed enums only; every
//! caller-supplied value travels as a parameter.

use std::collections::BTreeMap;

use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::{Direction, Scalar};
use crate::schema::EdgeType;

use super::LinkInstruction;

/// Result column holding the subject node.
pub const SUBJECT: &str = "n1";
/// Result column holding the adjacent edge.
pub const EDGE: &str = "r";
/// Result column holding the node at the edge's other end.
pub const NEIGHBOR: &str = "n2";
/// Result column holding an affected-entity count.
pub const AFFECTED: &str = "affected";

/// A statement parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A string, typically a public id.
    Text(String),
    /// A property map, applied with `SET n = $map`.
    Properties(BTreeMap<String, Scalar>),
}

/// A Cypher statement with its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text.
    pub text: String,
    /// Named parameters referenced by `text`.
    pub params: BTreeMap<&'static str, Param>,
}

impl Statement {
    fn new(text: String) -> Self {
        Self {
            text,
            params: BTreeMap::new(),
        }
    }

    fn with_id(mut self, name: &'static str, id: &NodeId) -> Self {
        self.params.insert(name, Param::Text(id.as_str().to_string()));
        self
    }
}

/// Every node of `label` with its adjacent edges.
#[must_use]
pub fn fetch_all(label: EntityLabel) -> Statement {
    Statement::new(format!(
        "MATCH ({SUBJECT}:{label}) OPTIONAL MATCH ({SUBJECT})-[{EDGE}]-({NEIGHBOR}) \
         RETURN {SUBJECT}, {EDGE}, {NEIGHBOR}"
    ))
}

/// One node with its adjacent edges.
#[must_use]
pub fn fetch_one(label: EntityLabel, id: &NodeId) -> Statement {
    Statement::new(format!(
        "MATCH ({SUBJECT}:{label} {{id: $id}}) OPTIONAL MATCH ({SUBJECT})-[{EDGE}]-({NEIGHBOR}) \
         RETURN {SUBJECT}, {EDGE}, {NEIGHBOR}"
    ))
    .with_id("id", id)
}

/// Detach-deletes one node, returning the number removed.
#[must_use]
pub fn remove(label: EntityLabel, id: &NodeId) -> Statement {
    Statement::new(format!(
        "MATCH ({SUBJECT}:{label} {{id: $id}}) DETACH DELETE {SUBJECT} RETURN count({SUBJECT}) AS {AFFECTED}"
    ))
    .with_id("id", id)
}

/// Replaces a node's properties. `MATCH` for updates, `MERGE` for inserts.
#[must_use]
pub fn merge_attributes(
    label: EntityLabel,
    id: &NodeId,
    attributes: &BTreeMap<String, Scalar>,
    is_update: bool,
) -> Statement {
    let clause = if is_update { "MATCH" } else { "MERGE" };
    let mut properties = attributes.clone();
    properties.insert("id".to_string(), Scalar::from(id.as_str()));

    let mut statement = Statement::new(format!(
        "{clause} ({SUBJECT}:{label} {{id: $id}}) SET {SUBJECT} = $attributes RETURN {SUBJECT}"
    ))
    .with_id("id", id);
    statement
        .params
        .insert("attributes", Param::Properties(properties));
    statement
}

fn pattern(edge_type: EdgeType, direction: Direction, var: &str) -> String {
    match direction {
        Direction::Outbound => format!("-[{var}:{edge_type}]->"),
        Direction::Inbound => format!("<-[{var}:{edge_type}]-"),
    }
}

/// Deletes one edge between the subject and a neighbor, if present.
#[must_use]
pub fn unlink(label: EntityLabel, id: &NodeId, link: &LinkInstruction) -> Statement {
    let arrow = pattern(link.edge_type, link.direction, EDGE);
    Statement::new(format!(
        "MATCH (a:{label} {{id: $id}}){arrow}(b:{} {{id: $neighbor}}) DELETE {EDGE} \
         RETURN count(*) AS {AFFECTED}",
        link.neighbor_label
    ))
    .with_id("id", id)
    .with_id("neighbor", &link.neighbor_id)
}

/// Creates one edge between the subject and a neighbor if absent. Returns
/// zero affected rows when either endpoint is missing.
#[must_use]
pub fn link(label: EntityLabel, id: &NodeId, link: &LinkInstruction) -> Statement {
    let arrow = pattern(link.edge_type, link.direction, EDGE);
    Statement::new(format!(
        "MATCH (a:{label} {{id: $id}}), (b:{} {{id: $neighbor}}) MERGE (a){arrow}(b) \
         RETURN count(*) AS {AFFECTED}",
        link.neighbor_label
    ))
    .with_id("id", id)
    .with_id("neighbor", &link.neighbor_id)
}

/// Creates `from -[edge_type]-> to` if absent.
#[must_use]
pub fn create_edge(
    from_id: &NodeId,
    from_label: EntityLabel,
    to_id: &NodeId,
    to_label: EntityLabel,
    edge_type: EdgeType,
) -> Statement {
    Statement::new(format!(
        "MATCH (a:{from_label} {{id: $from}}), (b:{to_label} {{id: $to}}) \
         MERGE (a)-[{EDGE}:{edge_type}]->(b) RETURN count(*) AS {AFFECTED}"
    ))
    .with_id("from", from_id)
    .with_id("to", to_id)
}

/// Deletes `from -[edge_type]-> to`.
#[must_use]
pub fn delete_edge(
    from_id: &NodeId,
    from_label: EntityLabel,
    to_id: &NodeId,
    to_label: EntityLabel,
    edge_type: EdgeType,
) -> Statement {
    Statement::new(format!(
        "MATCH (a:{from_label} {{id: $from}})-[{EDGE}:{edge_type}]->(b:{to_label} {{id: $to}}) \
         DELETE {EDGE} RETURN count(*) AS {AFFECTED}"
    ))
    .with_id("from", from_id)
    .with_id("to", to_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> NodeId {
        NodeId::parse("ada0000000000000000000").unwrap()
    }

    fn byron() -> NodeId {
        NodeId::parse("byron00000000000000000").unwrap()
    }

    #[test]
    fn test_fetch_all_text() {
        assert_eq!(
            fetch_all(EntityLabel::Person).text,
            "MATCH (n1:Person) OPTIONAL MATCH (n1)-[r]-(n2) RETURN n1, r, n2"
        );
        assert!(fetch_all(EntityLabel::Person).params.is_empty());
    }

    #[test]
    fn test_fetch_one_binds_id() {
        let stmt = fetch_one(EntityLabel::Event, &ada());
        assert!(stmt.text.starts_with("MATCH (n1:Event {id: $id})"));
        assert_eq!(stmt.params["id"], Param::Text(ada().to_string()));
    }

    #[test]
    fn test_remove_detaches() {
        let stmt = remove(EntityLabel::Tag, &ada());
        assert!(stmt.text.contains("DETACH DELETE n1"));
        assert!(stmt.text.ends_with("AS affected"));
    }

    #[test]
    fn test_merge_attributes_clause_and_id() {
        let mut attrs = BTreeMap::new();
        attrs.insert("tag".to_string(), Scalar::from("x"));

        let insert = merge_attributes(EntityLabel::Tag, &ada(), &attrs, false);
        let update = merge_attributes(EntityLabel::Tag, &ada(), &attrs, true);
        assert!(insert.text.starts_with("MERGE (n1:Tag"));
        assert!(update.text.starts_with("MATCH (n1:Tag"));

        let Param::Properties(props) = &insert.params["attributes"] else {
            panic!("expected property map");
        };
        assert_eq!(props["id"], Scalar::from(ada().as_str()));
        assert_eq!(props["tag"], Scalar::from("x"));
    }

    #[test]
    fn test_link_direction_patterns() {
        let outbound = LinkInstruction {
            edge_type: EdgeType::HasParent,
            neighbor_label: EntityLabel::Person,
            neighbor_id: byron(),
            direction: Direction::Outbound,
        };
        let inbound = LinkInstruction {
            edge_type: EdgeType::HasSource,
            neighbor_label: EntityLabel::Document,
            neighbor_id: byron(),
            direction: Direction::Inbound,
        };

        assert!(link(EntityLabel::Person, &ada(), &outbound)
            .text
            .contains("MERGE (a)-[r:HASPARENT]->(b)"));
        assert!(unlink(EntityLabel::Source, &ada(), &inbound)
            .text
            .contains("(a:Source {id: $id})<-[r:HASSOURCE]-(b:Document {id: $neighbor})"));
        assert_eq!(
            link(EntityLabel::Person, &ada(), &outbound).params["neighbor"],
            Param::Text(byron().to_string())
        );
    }

    #[test]
    fn test_edge_statements_bind_both_ends() {
        let create = create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent);
        let delete = delete_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent);
        for stmt in [create, delete] {
            assert_eq!(stmt.params["from"], Param::Text(ada().to_string()));
            assert_eq!(stmt.params["to"], Param::Text(byron().to_string()));
            assert!(stmt.text.contains("[r:HASPARENT]->"));
        }
    }
}
