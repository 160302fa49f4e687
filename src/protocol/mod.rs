//! Wire protocol for response payloads
//!
//! Defines the payload shape handed to and received from the transport
//! collaborator, plus JSON encoding and decoding.

pub mod serialize;
pub mod wire;

pub use serialize::{decode_response_part, encode_response_part};
pub use wire::{AddEntry, FieldDelta, IdentityDeltas, ResponsePart};
