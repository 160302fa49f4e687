//! WASM bindings for response state
//!
//! This module provides JavaScript-friendly bindings for the response summary.

#[cfg(feature = "wasm")]
pub mod bindings;

#[cfg(feature = "wasm")]
pub mod utils;

// Re-export main types
#[cfg(feature = "wasm")]
pub use bindings::WasmResponseSummary;
