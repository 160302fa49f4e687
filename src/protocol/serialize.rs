// Serialization layer - Convert payloads to/from JSON
//!
//! Parsing failures are reported as [`SummaryError::MalformedDelta`]: the
//! sender of a bad payload cannot see the failure, so it must not be
//! silently dropped on the receiving end.

use crate::error::{Result, SummaryError};
use crate::protocol::ResponsePart;

/// Decode a payload from a JSON string
pub fn decode_response_part(json: &str) -> Result<ResponsePart> {
    let part: ResponsePart = serde_json::from_str(json)
        .map_err(|e| SummaryError::malformed(format!("failed to decode payload: {}", e)))?;
    part.validate()?;
    Ok(part)
}

/// Decode a payload from an already-parsed JSON value
pub fn decode_response_part_value(json: serde_json::Value) -> Result<ResponsePart> {
    let part: ResponsePart = serde_json::from_value(json)
        .map_err(|e| SummaryError::malformed(format!("failed to decode payload: {}", e)))?;
    part.validate()?;
    Ok(part)
}

/// Encode a payload as a JSON value
pub fn encode_response_part(part: &ResponsePart) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(part)?)
}

/// Encode a payload as a JSON string
pub fn encode_response_part_string(part: &ResponsePart) -> Result<String> {
    Ok(serde_json::to_string(part)?)
}

impl ResponsePart {
    pub fn from_json_str(json: &str) -> Result<Self> {
        decode_response_part(json)
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        decode_response_part_value(json)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        encode_response_part(self)
    }
}
