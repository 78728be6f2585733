//! Tests for the in-memory graph executor.

use std::collections::BTreeMap;

use super::*;
use crate::error::Error;

fn id(text: &str) -> NodeId {
    NodeId::parse(text).unwrap()
}

fn ada() -> NodeId {
    id("ada0000000000000000000")
}

fn byron() -> NodeId {
    id("byron00000000000000000")
}

fn event() -> NodeId {
    id("event00000000000000000")
}

async fn seed(graph: &InMemoryGraph, label: EntityLabel, node: &NodeId) {
    graph
        .merge_attributes(label, node, &BTreeMap::new(), false)
        .await
        .unwrap();
}

fn parent_link(neighbor: NodeId) -> LinkInstruction {
    LinkInstruction {
        edge_type: EdgeType::HasParent,
        neighbor_label: EntityLabel::Person,
        neighbor_id: neighbor,
        direction: Direction::Outbound,
    }
}

// ── Node CRUD ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_merge_creates_and_returns_subject_row() {
    let graph = InMemoryGraph::new();
    let mut attrs = BTreeMap::new();
    attrs.insert("firstname".to_string(), Scalar::from("Ada"));

    let rows = graph
        .merge_attributes(EntityLabel::Person, &ada(), &attrs, false)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert!(rows[0].edge.is_none());
    assert_eq!(rows[0].subject.labels, vec!["Person".to_string()]);
    assert_eq!(rows[0].subject.properties["id"], Scalar::from(ada().as_str()));
    assert_eq!(rows[0].subject.properties["firstname"], Scalar::from("Ada"));
    assert_eq!(graph.node_count(), 1);
}

#[tokio::test]
async fn test_merge_replaces_attributes() {
    let graph = InMemoryGraph::new();
    let mut attrs = BTreeMap::new();
    attrs.insert("firstname".to_string(), Scalar::from("Ada"));
    graph
        .merge_attributes(EntityLabel::Person, &ada(), &attrs, false)
        .await
        .unwrap();

    let mut replaced = BTreeMap::new();
    replaced.insert("lastname".to_string(), Scalar::from("Lovelace"));
    let rows = graph
        .merge_attributes(EntityLabel::Person, &ada(), &replaced, true)
        .await
        .unwrap();

    let props = &rows[0].subject.properties;
    assert!(!props.contains_key("firstname"));
    assert_eq!(props["lastname"], Scalar::from("Lovelace"));
    assert_eq!(graph.node_count(), 1);
}

#[tokio::test]
async fn test_update_of_missing_node_is_not_found() {
    let graph = InMemoryGraph::new();
    let err = graph
        .merge_attributes(EntityLabel::Person, &ada(), &BTreeMap::new(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(graph.node_count(), 0);
}

#[tokio::test]
async fn test_insert_with_id_taken_by_other_label_fails() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    let err = graph
        .merge_attributes(EntityLabel::Tag, &ada(), &BTreeMap::new(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[tokio::test]
async fn test_fetch_one_respects_label() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;

    assert!(graph.fetch_one(EntityLabel::Person, &ada()).await.is_ok());
    let err = graph.fetch_one(EntityLabel::Event, &ada()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_fetch_all_filters_by_label() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    seed(&graph, EntityLabel::Event, &event()).await;

    let rows = graph.fetch_all(EntityLabel::Person).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.subject.labels == vec!["Person".to_string()]));

    assert!(graph.fetch_all(EntityLabel::Tag).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_cascades_edges() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    graph
        .create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
        .await
        .unwrap();
    assert_eq!(graph.edge_count(), 1);

    assert_eq!(graph.remove(EntityLabel::Person, &byron()).await.unwrap(), 1);
    assert_eq!(graph.edge_count(), 0);

    let rows = graph.fetch_one(EntityLabel::Person, &ada()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].edge.is_none());
}

#[tokio::test]
async fn test_remove_missing_returns_zero() {
    let graph = InMemoryGraph::new();
    assert_eq!(graph.remove(EntityLabel::Person, &ada()).await.unwrap(), 0);
}

// ── Edges ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rows_carry_both_directions() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    graph
        .create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
        .await
        .unwrap();

    let child_rows = graph.fetch_one(EntityLabel::Person, &ada()).await.unwrap();
    let parent_rows = graph.fetch_one(EntityLabel::Person, &byron()).await.unwrap();

    let edge = child_rows[0].edge.as_ref().unwrap();
    assert_eq!(edge.edge_type, "HASPARENT");
    assert_eq!(edge.start, child_rows[0].subject.internal_id);
    assert_eq!(parent_rows[0].edge.as_ref().unwrap().end, parent_rows[0].subject.internal_id);
    assert_eq!(
        parent_rows[0].neighbor.as_ref().unwrap().properties["id"],
        Scalar::from(ada().as_str())
    );
}

#[tokio::test]
async fn test_create_edge_is_idempotent() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    for _ in 0..3 {
        graph
            .create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
            .await
            .unwrap();
    }
    assert_eq!(graph.edge_count(), 1);
}

#[tokio::test]
async fn test_create_edge_missing_endpoint() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    let err = graph
        .create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn test_delete_edge_missing_is_not_found() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    let err = graph
        .delete_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_apply_diff_adds_and_removes() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    let annabella = id("annabella0000000000000");
    seed(&graph, EntityLabel::Person, &annabella).await;

    graph
        .apply_relationship_diff(EntityLabel::Person, &ada(), &[], &[parent_link(byron())])
        .await
        .unwrap();
    graph
        .apply_relationship_diff(
            EntityLabel::Person,
            &ada(),
            &[parent_link(byron())],
            &[parent_link(annabella.clone())],
        )
        .await
        .unwrap();

    let rows = graph.fetch_one(EntityLabel::Person, &ada()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].neighbor.as_ref().unwrap().properties["id"],
        Scalar::from(annabella.as_str())
    );
}

#[tokio::test]
async fn test_apply_diff_missing_neighbor_applies_nothing() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    seed(&graph, EntityLabel::Person, &byron()).await;
    graph
        .create_edge(&ada(), EntityLabel::Person, &byron(), EntityLabel::Person, EdgeType::HasParent)
        .await
        .unwrap();

    let err = graph
        .apply_relationship_diff(
            EntityLabel::Person,
            &ada(),
            &[parent_link(byron())],
            &[parent_link(id("ghost00000000000000000"))],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(graph.edge_count(), 1);
}

#[tokio::test]
async fn test_apply_diff_inbound_direction() {
    let graph = InMemoryGraph::new();
    let source = id("source0000000000000000");
    let document = id("document00000000000000");
    seed(&graph, EntityLabel::Source, &source).await;
    seed(&graph, EntityLabel::Document, &document).await;

    let link = LinkInstruction {
        edge_type: EdgeType::HasSource,
        neighbor_label: EntityLabel::Document,
        neighbor_id: document.clone(),
        direction: Direction::Inbound,
    };
    graph
        .apply_relationship_diff(EntityLabel::Source, &source, &[], &[link])
        .await
        .unwrap();

    let rows = graph.fetch_one(EntityLabel::Document, &document).await.unwrap();
    let edge = rows[0].edge.as_ref().unwrap();
    assert_eq!(edge.start, rows[0].subject.internal_id);
    assert_eq!(edge.edge_type, "HASSOURCE");
}

// ── Availability ────────────────────────────────────────────────────

#[tokio::test]
async fn test_offline_graph_is_unavailable() {
    let graph = InMemoryGraph::new();
    seed(&graph, EntityLabel::Person, &ada()).await;
    graph.set_offline(true);

    let err = graph.fetch_all(EntityLabel::Person).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    let err = graph.remove(EntityLabel::Person, &ada()).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));

    graph.set_offline(false);
    assert_eq!(graph.fetch_all(EntityLabel::Person).await.unwrap().len(), 1);
}
