//! Public node identifiers.
//!
//! A node id is a 22-character token over `[A-Za-z0-9_]`, unique across the
//! whole graph. Generated ids are a random v4 UUID in the Flickr base58
//! alphabet, left-padded with the alphabet's zero digit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Length of every node id.
pub const NODE_ID_LEN: usize = 22;

const FLICKR_BASE58: &[u8; 58] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Public identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Parses and validates a node id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` unless `s` is exactly 22 characters
    /// of `[A-Za-z0-9_]`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let valid = s.len() == NODE_ID_LEN
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidArgument(format!("malformed node id '{s}'")))
        }
    }

    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(encode_base58(Uuid::new_v4().as_u128()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode_base58(mut value: u128) -> String {
    let mut digits = [FLICKR_BASE58[0]; NODE_ID_LEN];
    let mut pos = NODE_ID_LEN;
    while value > 0 && pos > 0 {
        pos -= 1;
        // Reason: remainder is always < 58, fits in usize
        #[allow(clippy::cast_possible_truncation)]
        let digit = (value % 58) as usize;
        digits[pos] = FLICKR_BASE58[digit];
        value /= 58;
    }
    digits.iter().map(|&b| char::from(b)).collect()
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
