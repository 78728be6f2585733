//! Relation schema table.
//!
//! Static mapping from an ordered pair of labels to the single edge type
//! allowed between them, and per label the attribute names that carry
//! relationships. Adding a relationship is a table entry here; nothing else
//! in the store branches on labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::label::EntityLabel;
use crate::model::Direction;

/// Relationship type between two labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeType {
    /// Person -> Person (child to parent).
    HasParent,
    /// Person -> Event.
    Attended,
    /// Event -> Location.
    HappenedAt,
    /// Location -> Location (child place to enclosing place).
    PartOf,
    /// Location -> LocationType.
    HasType,
    /// Document -> Source.
    HasSource,
    /// Document -> Person.
    Mentions,
    /// Document -> Event.
    Records,
    /// Any taggable label -> Tag.
    TaggedWith,
}

impl EdgeType {
    /// All edge types.
    pub const ALL: [EdgeType; 9] = [
        Self::HasParent,
        Self::Attended,
        Self::HappenedAt,
        Self::PartOf,
        Self::HasType,
        Self::HasSource,
        Self::Mentions,
        Self::Records,
        Self::TaggedWith,
    ];

    /// Returns the relationship type as stored in the graph.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HasParent => "HASPARENT",
            Self::Attended => "ATTENDED",
            Self::HappenedAt => "HAPPENEDAT",
            Self::PartOf => "PARTOF",
            Self::HasType => "HASTYPE",
            Self::HasSource => "HASSOURCE",
            Self::Mentions => "MENTIONS",
            Self::Records => "RECORDS",
            Self::TaggedWith => "TAGGEDWITH",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|edge| edge.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown edge type '{s}'")))
    }
}

/// How many neighbors a relationship field may link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one linked id.
    One,
    /// A set of linked ids.
    Many,
}

/// A relationship-carrying attribute of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Attribute name in the payload.
    pub name: &'static str,
    /// Edge type backing the field.
    pub edge_type: EdgeType,
    /// Label of the linked nodes.
    pub neighbor: EntityLabel,
    /// One or many.
    pub cardinality: Cardinality,
    /// Edge direction relative to the owning node.
    pub direction: Direction,
}

impl FieldDescriptor {
    const fn new(
        name: &'static str,
        edge_type: EdgeType,
        neighbor: EntityLabel,
        cardinality: Cardinality,
        direction: Direction,
    ) -> Self {
        Self {
            name,
            edge_type,
            neighbor,
            cardinality,
            direction,
        }
    }
}

use Cardinality::{Many, One};
use Direction::{Inbound, Outbound};
use EntityLabel::{Document, Event, Location, LocationType, Person, Source, Tag};

/// `(from, to) -> edge type`.
const RELATION_SCHEMA: &[(EntityLabel, EntityLabel, EdgeType)] = &[
    (Person, Person, EdgeType::HasParent),
    (Person, Event, EdgeType::Attended),
    (Event, Location, EdgeType::HappenedAt),
    (Location, Location, EdgeType::PartOf),
    (Location, LocationType, EdgeType::HasType),
    (Document, Source, EdgeType::HasSource),
    (Document, Person, EdgeType::Mentions),
    (Document, Event, EdgeType::Records),
    (Person, Tag, EdgeType::TaggedWith),
    (Event, Tag, EdgeType::TaggedWith),
    (Location, Tag, EdgeType::TaggedWith),
    (Document, Tag, EdgeType::TaggedWith),
    (Source, Tag, EdgeType::TaggedWith),
];

const PERSON_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("hasparents", EdgeType::HasParent, Person, Many, Outbound),
    FieldDescriptor::new("attended", EdgeType::Attended, Event, Many, Outbound),
    FieldDescriptor::new("tags", EdgeType::TaggedWith, Tag, Many, Outbound),
];

const EVENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("location", EdgeType::HappenedAt, Location, One, Outbound),
    FieldDescriptor::new("tags", EdgeType::TaggedWith, Tag, Many, Outbound),
];

const LOCATION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("partof", EdgeType::PartOf, Location, One, Outbound),
    FieldDescriptor::new("locationtype", EdgeType::HasType, LocationType, One, Outbound),
    FieldDescriptor::new("tags", EdgeType::TaggedWith, Tag, Many, Outbound),
];

const DOCUMENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("source", EdgeType::HasSource, Source, One, Outbound),
    FieldDescriptor::new("mentions", EdgeType::Mentions, Person, Many, Outbound),
    FieldDescriptor::new("records", EdgeType::Records, Event, Many, Outbound),
    FieldDescriptor::new("tags", EdgeType::TaggedWith, Tag, Many, Outbound),
];

const SOURCE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("documents", EdgeType::HasSource, Document, Many, Inbound),
    FieldDescriptor::new("tags", EdgeType::TaggedWith, Tag, Many, Outbound),
];

/// Returns the edge type allowed from `from` to `to`, if any.
#[must_use]
pub fn edge_type_for(from: EntityLabel, to: EntityLabel) -> Option<EdgeType> {
    RELATION_SCHEMA
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, edge)| *edge)
}

/// Returns the relationship fields declared for `label`.
#[must_use]
pub fn relationship_fields(label: EntityLabel) -> &'static [FieldDescriptor] {
    match label {
        Person => PERSON_FIELDS,
        Event => EVENT_FIELDS,
        Location => LOCATION_FIELDS,
        Document => DOCUMENT_FIELDS,
        Source => SOURCE_FIELDS,
        LocationType | Tag => &[],
    }
}
