//! Error types for response state operations
//!
//! Every error here is synchronous and local. Nothing in this crate retries;
//! callers decide how to surface failures.

use thiserror::Error;

/// Errors raised by registers, indices and the response summary
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A read or write referenced a field that was never registered
    #[error("field `{0}` has not been registered")]
    UnregisteredField(String),

    /// A policy identifier did not name one of the known merge policies
    #[error("unknown merge policy `{0}`")]
    InvalidPolicy(String),

    /// A field was registered twice with different policies
    #[error("field `{field}` is already registered as {existing}, cannot re-register as {requested}")]
    PolicyConflict {
        field: String,
        existing: crate::crdt::Policy,
        requested: crate::crdt::Policy,
    },

    /// An inbound payload did not match the wire shape
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// JSON (de)serialization failed outside of delta parsing
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SummaryError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        SummaryError::MalformedDelta(msg.into())
    }
}

/// Result type for response state operations
pub type Result<T> = std::result::Result<T, SummaryError>;
