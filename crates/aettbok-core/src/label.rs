//! The closed set of entity labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Entity type of a node.
///
/// Labels are a closed set; [`EntityLabel::as_str`] is the only label text
/// that ever reaches a query's structural position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityLabel {
    /// A scanned or transcribed record.
    Document,
    /// Birth, marriage, death, census and so on.
    Event,
    /// A place.
    Location,
    /// Classification of places (country, parish, farm).
    LocationType,
    /// An individual.
    Person,
    /// Archive or publication a document comes from.
    Source,
    /// Free-form user tag.
    Tag,
}

impl EntityLabel {
    /// All labels, in declaration order.
    pub const ALL: [EntityLabel; 7] = [
        Self::Document,
        Self::Event,
        Self::Location,
        Self::LocationType,
        Self::Person,
        Self::Source,
        Self::Tag,
    ];

    /// Returns the label as it is stored in the graph.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Event => "Event",
            Self::Location => "Location",
            Self::LocationType => "LocationType",
            Self::Person => "Person",
            Self::Source => "Source",
            Self::Tag => "Tag",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = Error;

    /// Parses a label. Matching is case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown label '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for label in EntityLabel::ALL {
            assert_eq!(label.as_str().parse::<EntityLabel>().unwrap(), label);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("person".parse::<EntityLabel>().is_err());
        assert!("Persons".parse::<EntityLabel>().is_err());
        assert!("".parse::<EntityLabel>().is_err());
    }
}
