//! Error types for aettbok-core.
//!
//! Every failure surfaced by the entity store is exactly one of these kinds.
//! Store and cache client errors are converted at the executor and cache
//! boundaries; raw client errors never escape the core.

use thiserror::Error;

use crate::label::EntityLabel;

/// Entity store error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed id, unrecognized label, self relation or failed field validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown label + id combination, or zero nodes/edges affected.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No relation schema entry exists for the ordered label pair.
    #[error("Relationship not allowed: {from} -> {to}")]
    RelationshipNotAllowed {
        /// Label of the relationship's start node.
        from: EntityLabel,
        /// Label of the relationship's end node.
        to: EntityLabel,
    },

    /// The graph store client failed.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// The key-value cache client failed.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other unexpected failure, including malformed store responses.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::RelationshipNotAllowed`].
    RelationshipNotAllowed,
    /// See [`Error::StoreUnavailable`].
    StoreUnavailable,
    /// See [`Error::CacheUnavailable`].
    CacheUnavailable,
    /// See [`Error::Config`].
    Config,
    /// See [`Error::Internal`].
    Internal,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RelationshipNotAllowed { .. } => ErrorKind::RelationshipNotAllowed,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::CacheUnavailable(_) => ErrorKind::CacheUnavailable,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for entity store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("malformed id 'abc'".to_string());
        assert_eq!(err.to_string(), "Invalid argument: malformed id 'abc'");

        let err = Error::RelationshipNotAllowed {
            from: EntityLabel::Tag,
            to: EntityLabel::Person,
        };
        assert_eq!(err.to_string(), "Relationship not allowed: Tag -> Person");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::NotFound("Person:x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::CacheUnavailable("down".into()).kind(),
            ErrorKind::CacheUnavailable
        );
    }
}
