//! Field schema validation.
//!
//! Turns a raw JSON payload into the label-declared scalar attributes plus the
//! desired link set of every relationship field. Unknown keys are dropped;
//! `null` on a nullable field means "not stored".

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::label::EntityLabel;
use crate::model::Scalar;
use crate::schema::{relationship_fields, Cardinality, FieldDescriptor};

use self::FieldKind::{Boolean, Number, String as Text};

/// JSON type of a declared scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Number, Value::Number(_))
                | (Self::Boolean, Value::Bool(_))
        )
    }
}

/// A declared scalar attribute of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Attribute name.
    pub name: &'static str,
    /// Expected JSON type.
    pub kind: FieldKind,
    /// Whether the attribute may be `null` or absent.
    pub nullable: bool,
}

const fn field(name: &'static str, kind: FieldKind, nullable: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        nullable,
    }
}

const DOCUMENT_ATTRS: &[FieldSpec] = &[field("title", Text, false), field("date", Text, true)];

const EVENT_ATTRS: &[FieldSpec] = &[
    field("type", Text, false),
    field("day", Number, true),
    field("month", Number, true),
    field("year", Number, true),
];

const LOCATION_ATTRS: &[FieldSpec] = &[
    field("location", Text, false),
    field("latitude", Number, true),
    field("longitude", Number, true),
];

const LOCATION_TYPE_ATTRS: &[FieldSpec] = &[
    field("default", Boolean, false),
    field("hierarchy", Number, false),
    field("type", Text, false),
];

const PERSON_ATTRS: &[FieldSpec] = &[
    field("firstname", Text, true),
    field("lastname", Text, true),
    field("gender", Text, false),
    field("alive", Boolean, false),
];

const SOURCE_ATTRS: &[FieldSpec] = &[field("title", Text, false), field("url", Text, true)];

const TAG_ATTRS: &[FieldSpec] = &[field("color", Text, false), field("tag", Text, false)];

/// Returns the declared scalar attributes of `label`.
#[must_use]
pub fn attribute_fields(label: EntityLabel) -> &'static [FieldSpec] {
    match label {
        EntityLabel::Document => DOCUMENT_ATTRS,
        EntityLabel::Event => EVENT_ATTRS,
        EntityLabel::Location => LOCATION_ATTRS,
        EntityLabel::LocationType => LOCATION_TYPE_ATTRS,
        EntityLabel::Person => PERSON_ATTRS,
        EntityLabel::Source => SOURCE_ATTRS,
        EntityLabel::Tag => TAG_ATTRS,
    }
}

/// Desired value of one relationship field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredLinks {
    /// Cardinality-one field: the linked id, or `None` to clear.
    One(Option<NodeId>),
    /// Cardinality-many field: the full set of linked ids.
    Many(BTreeSet<NodeId>),
}

impl DesiredLinks {
    /// Returns the desired ids as a set.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<NodeId> {
        match self {
            Self::One(id) => id.iter().cloned().collect(),
            Self::Many(ids) => ids.clone(),
        }
    }

    fn empty(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => Self::One(None),
            Cardinality::Many => Self::Many(BTreeSet::new()),
        }
    }
}

/// Validated payload of an upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedPayload {
    /// Declared scalar attributes; nulls removed.
    pub attributes: BTreeMap<String, Scalar>,
    /// Desired links per relationship field name. Every field of the label is
    /// present; omitted fields map to an empty value.
    pub relations: BTreeMap<&'static str, DesiredLinks>,
}

/// Validates raw payloads against a label's field schema.
pub trait FieldValidator: Send + Sync {
    /// Validates `raw` for a node `node_id` of `label`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when the payload does not satisfy the
    /// label's schema or links the node to itself.
    fn validate(&self, label: EntityLabel, node_id: &NodeId, raw: &Value) -> Result<ValidatedPayload>;
}

/// Default validator backed by [`attribute_fields`] and the relation schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl FieldValidator for SchemaValidator {
    fn validate(&self, label: EntityLabel, node_id: &NodeId, raw: &Value) -> Result<ValidatedPayload> {
        let object = raw
            .as_object()
            .ok_or_else(|| Error::InvalidArgument(format!("{label} payload must be a JSON object")))?;

        let mut payload = ValidatedPayload::default();

        for spec in attribute_fields(label) {
            match object.get(spec.name) {
                None | Some(Value::Null) if spec.nullable => {}
                None | Some(Value::Null) => {
                    return Err(Error::InvalidArgument(format!(
                        "{label}.{} is required",
                        spec.name
                    )));
                }
                Some(value) if spec.kind.matches(value) => {
                    let scalar = Scalar::from_json(value).ok_or_else(|| {
                        Error::InvalidArgument(format!("{label}.{} is not representable", spec.name))
                    })?;
                    payload.attributes.insert(spec.name.to_string(), scalar);
                }
                Some(_) => {
                    return Err(Error::InvalidArgument(format!(
                        "{label}.{} must be a {}",
                        spec.name,
                        spec.kind.name()
                    )));
                }
            }
        }

        for descriptor in relationship_fields(label) {
            let links = parse_links(label, descriptor, object, node_id)?;
            payload.relations.insert(descriptor.name, links);
        }

        Ok(payload)
    }
}

fn parse_links(
    label: EntityLabel,
    descriptor: &FieldDescriptor,
    object: &Map<String, Value>,
    node_id: &NodeId,
) -> Result<DesiredLinks> {
    let parse_id = |value: &Value| -> Result<NodeId> {
        let text = value.as_str().ok_or_else(|| {
            Error::InvalidArgument(format!("{label}.{} ids must be strings", descriptor.name))
        })?;
        let id = NodeId::parse(text)?;
        if &id == node_id {
            return Err(Error::InvalidArgument(format!(
                "{label}.{} cannot link {id} to itself",
                descriptor.name
            )));
        }
        Ok(id)
    };

    let value = match object.get(descriptor.name) {
        None | Some(Value::Null) => return Ok(DesiredLinks::empty(descriptor.cardinality)),
        Some(value) => value,
    };

    match descriptor.cardinality {
        Cardinality::One => parse_id(value).map(|id| DesiredLinks::One(Some(id))),
        Cardinality::Many => {
            let items = value.as_array().ok_or_else(|| {
                Error::InvalidArgument(format!("{label}.{} must be an array of ids", descriptor.name))
            })?;
            items
                .iter()
                .map(parse_id)
                .collect::<Result<BTreeSet<_>>>()
                .map(DesiredLinks::Many)
        }
    }
}
