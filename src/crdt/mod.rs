//! CRDT (Conflict-free Replicated Data Types) for participant responses
//!
//! This module contains the per-identity registers and the index that
//! groups them by participant for one field.
//!
//! # Layers
//!
//! - **Register:** one identity's value for one field, under a [`Policy`]
//! - **StateIndex:** one register per identity that has touched a field
//!
//! # References
//!
//! - "A comprehensive study of CRDTs" by Marc Shapiro et al.
//! - "Conflict-free Replicated Data Types" (INRIA Research Report 7687)

pub mod index;
pub mod policy;
pub mod register;
pub mod value;

pub use index::StateIndex;
pub use policy::Policy;
pub use register::Register;
pub use value::{IdentityState, StateValue};
