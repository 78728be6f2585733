//! Relationship diff & merge engine.
//!
//! Computes, per relationship field, the edges to delete and the edges to
//! create so a node's links move from their current state to the desired
//! state. The engine is label-agnostic: everything it needs comes from the
//! field descriptors.

use std::collections::{BTreeMap, BTreeSet};

use crate::fields::DesiredLinks;
use crate::graph::LinkInstruction;
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::Relation;
use crate::schema::FieldDescriptor;

/// Edge removals and additions for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipDiff {
    /// Edges to delete.
    pub removals: Vec<LinkInstruction>,
    /// Edges to create.
    pub additions: Vec<LinkInstruction>,
}

impl RelationshipDiff {
    /// Computes the diff between `current` relations and `desired` links.
    ///
    /// A field missing from `desired` means no links: all of its current
    /// relations are removed.
    #[must_use]
    pub fn compute(
        fields: &[FieldDescriptor],
        current: &[Relation],
        desired: &BTreeMap<&'static str, DesiredLinks>,
    ) -> Self {
        let mut diff = Self::default();

        for field in fields {
            let present: BTreeSet<NodeId> = current
                .iter()
                .filter(|r| {
                    r.edge_type == field.edge_type
                        && r.direction == field.direction
                        && r.neighbor_label == field.neighbor
                })
                .map(|r| r.neighbor_id.clone())
                .collect();
            let wanted = desired.get(field.name).map(DesiredLinks::ids).unwrap_or_default();

            let instruction = |neighbor_id: &NodeId| LinkInstruction {
                edge_type: field.edge_type,
                neighbor_label: field.neighbor,
                neighbor_id: neighbor_id.clone(),
                direction: field.direction,
            };

            diff.removals
                .extend(present.difference(&wanted).map(instruction));
            diff.additions
                .extend(wanted.difference(&present).map(instruction));
        }

        diff
    }

    /// Returns `true` if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }

    /// Returns every neighbor gaining or losing an edge.
    #[must_use]
    pub fn touched(&self) -> BTreeSet<(EntityLabel, NodeId)> {
        self.removals
            .iter()
            .chain(&self.additions)
            .map(|link| (link.neighbor_label, link.neighbor_id.clone()))
            .collect()
    }
}
