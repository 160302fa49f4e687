//! Field registration config
//!
//! Lets the owning object declare its fields as data:
//!
//! ```json
//! { "fields": [ { "name": "rating", "policy": "FIRST_WRITER_WINS" } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::crdt::Policy;
use crate::error::Result;

/// One field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,

    /// Policy wire name, validated at registration
    pub policy: String,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, policy: Policy) -> Self {
        Self {
            name: name.into(),
            policy: policy.to_string(),
        }
    }

    /// Parse the declared policy
    pub fn policy(&self) -> Result<Policy> {
        self.policy.parse()
    }
}

/// Every field a response summary registers at construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl SummaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration
    pub fn with_field(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.fields.push(FieldConfig::new(name, policy));
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
