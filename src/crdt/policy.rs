//! Merge policies for single-actor registers
//!
//! A policy is fixed when a field is registered and decides how a register
//! resolves its op log into a current value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SummaryError;

/// Conflict policy governing one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    /// Write-once: the logically first add wins, removes are ignored
    FirstWriterWins,

    /// The logically newest add wins, removes are ignored
    LastWriterWins,

    /// The logically newest add wins; removing the current value clears it
    LastWriterWinsNullable,

    /// Observed-remove set of distinct values
    Set,
}

impl Policy {
    /// All policies, in declaration order
    pub const ALL: [Policy; 4] = [
        Policy::FirstWriterWins,
        Policy::LastWriterWins,
        Policy::LastWriterWinsNullable,
        Policy::Set,
    ];

    /// Wire name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::FirstWriterWins => "FIRST_WRITER_WINS",
            Policy::LastWriterWins => "LAST_WRITER_WINS",
            Policy::LastWriterWinsNullable => "LAST_WRITER_WINS_NULLABLE",
            Policy::Set => "SET",
        }
    }

    /// Whether the policy holds a single value (as opposed to a set)
    pub fn is_scalar(&self) -> bool {
        match self {
            Policy::FirstWriterWins | Policy::LastWriterWins | Policy::LastWriterWinsNullable => {
                true
            }
            Policy::Set => false,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| SummaryError::InvalidPolicy(s.to_string()))
    }
}
