//! Response CRDT - Convergent participant responses
//!
//! Many clients record per-participant responses to a shared interactive
//! object (a poll choice, a rating, a feedback comment) and converge on the
//! same state without a central arbiter, whatever order deltas arrive in
//! and however often they are duplicated.
//!
//! It implements:
//! - Single-actor registers under four merge policies
//! - A per-field index of registers keyed by participant
//! - A response summary that ingests and produces wire payloads
//!
//! # Examples
//!
//! ```rust
//! use response_crdt::{LocalActor, Policy, ResponseSummary};
//!
//! let mut summary = ResponseSummary::new(LocalActor::new("user-1"));
//! summary.register_state("choices", Policy::Set).unwrap();
//! summary.add_state("choices", serde_json::json!("option-a")).unwrap();
//! ```

pub mod config;
pub mod crdt;
pub mod error;
pub mod op;
pub mod protocol;
pub mod summary;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use config::{FieldConfig, SummaryConfig};
pub use crdt::{IdentityState, Policy, Register, StateIndex, StateValue};
pub use error::{Result, SummaryError};
pub use op::{LamportIdGenerator, LocalActor, OpId, OpIdGenerator};
pub use protocol::{FieldDelta, ResponsePart};
pub use summary::ResponseSummary;

/// Participant identifier type
pub type IdentityId = String;

/// Name of a registered response field
pub type FieldName = String;
