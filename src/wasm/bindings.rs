//! JavaScript bindings for the response summary
//!
//! Values and payloads cross the boundary as JSON strings.

use crate::error::SummaryError;
use crate::{LocalActor, ResponseSummary, SummaryConfig};
use wasm_bindgen::prelude::*;

fn to_js(err: SummaryError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_json(json: &str, what: &str) -> Result<serde_json::Value, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

/// JavaScript-friendly wrapper for ResponseSummary
#[wasm_bindgen]
pub struct WasmResponseSummary {
    inner: ResponseSummary,
}

#[wasm_bindgen]
impl WasmResponseSummary {
    /// Create a summary whose local writes are attributed to `identity`
    #[wasm_bindgen(constructor)]
    pub fn new(identity: String) -> Self {
        Self {
            inner: ResponseSummary::new(LocalActor::new(identity)),
        }
    }

    /// Create a summary and register the fields of a JSON config
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(identity: String, config_json: String) -> Result<WasmResponseSummary, JsValue> {
        let config = SummaryConfig::from_json_str(&config_json).map_err(to_js)?;
        ResponseSummary::from_config(LocalActor::new(identity), &config)
            .map(|inner| Self { inner })
            .map_err(to_js)
    }

    /// Get the local identity
    #[wasm_bindgen(js_name = getLocalIdentity)]
    pub fn get_local_identity(&self) -> String {
        self.inner.local_identity().clone()
    }

    /// Register a field under a policy name such as "SET"
    #[wasm_bindgen(js_name = registerState)]
    pub fn register_state(&mut self, field: String, policy: String) -> Result<(), JsValue> {
        self.inner
            .register_state_named(field, &policy)
            .map_err(to_js)
    }

    /// Write a value for the local identity (pass JSON string)
    #[wasm_bindgen(js_name = addState)]
    pub fn add_state(&mut self, field: String, value_json: String) -> Result<bool, JsValue> {
        let value = parse_json(&value_json, "value")?;
        self.inner.add_state(&field, value).map_err(to_js)
    }

    /// Remove a value for the local identity (pass JSON string)
    #[wasm_bindgen(js_name = removeState)]
    pub fn remove_state(&mut self, field: String, value_json: String) -> Result<bool, JsValue> {
        let value = parse_json(&value_json, "value")?;
        self.inner.remove_state(&field, &value).map_err(to_js)
    }

    /// Get one identity's value (returns JSON string)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, field: String, identity: String) -> Result<String, JsValue> {
        let value = self.inner.get_state(&field, &identity).map_err(to_js)?;
        serde_json::to_string(&value)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    /// Get answering identities' values (pass JSON array of ids, returns JSON string)
    #[wasm_bindgen(js_name = getStates)]
    pub fn get_states(&self, field: String, identities_json: String) -> Result<String, JsValue> {
        let identities: Vec<String> = serde_json::from_str(&identities_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid identities JSON: {}", e)))?;
        let states = self.inner.get_states(&field, identities.as_slice()).map_err(to_js)?;
        serde_json::to_string(&states)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    /// Ingest an inbound payload (pass JSON string)
    #[wasm_bindgen(js_name = parseResponsePart)]
    pub fn parse_response_part(&mut self, payload_json: String) -> Result<usize, JsValue> {
        self.inner
            .parse_response_part_json(&payload_json)
            .map_err(to_js)
    }

    /// Drain un-sent local operations as a JSON payload
    #[wasm_bindgen(js_name = takePendingResponsePart)]
    pub fn take_pending_response_part(&mut self) -> Result<String, JsValue> {
        let part = self.inner.take_pending_response_part();
        crate::protocol::serialize::encode_response_part_string(&part).map_err(to_js)
    }

    /// Export full state as a JSON payload
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        crate::protocol::serialize::encode_response_part_string(&self.inner.snapshot())
            .map_err(to_js)
    }
}
