//! Operation ID: Unique identifier for register operations
//!
//! Each add operation carries one or more IDs composed of:
//! - Clock: Lamport timestamp on the replica that created it
//! - Replica: random UUID of the creating process
//!
//! On the wire an ID is the string `"<clock>@<replica>"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SummaryError;

/// Unique identifier for an operation
///
/// Ordered by clock first, then by replica for deterministic tie-breaking.
/// This is the "logical sequence" used by the writer-wins policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId {
    /// Lamport clock at creation time
    pub clock: u64,

    /// Replica that created this operation
    pub replica: Uuid,
}

impl OpId {
    /// Clock no replica can tick past; payloads carrying it are rejected
    pub const MAX_CLOCK: u64 = u64::MAX;

    /// Create a new operation ID
    pub fn new(clock: u64, replica: Uuid) -> Self {
        Self { clock, replica }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.clock, self.replica)
    }
}

impl FromStr for OpId {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (clock, replica) = s
            .split_once('@')
            .ok_or_else(|| SummaryError::malformed(format!("op id `{}` is missing `@`", s)))?;

        let clock = clock
            .parse::<u64>()
            .map_err(|e| SummaryError::malformed(format!("op id `{}` has bad clock: {}", s, e)))?;
        let replica = Uuid::parse_str(replica)
            .map_err(|e| SummaryError::malformed(format!("op id `{}` has bad replica: {}", s, e)))?;

        Ok(Self { clock, replica })
    }
}

impl Serialize for OpId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OpId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
