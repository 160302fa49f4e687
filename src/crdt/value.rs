//! Resolved register values

use serde::Serialize;
use serde_json::Value;

use super::Policy;
use crate::IdentityId;

/// The current value of a register
///
/// Scalar policies resolve to a single JSON value (`Null` when unset);
/// the set policy resolves to a sequence of distinct values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Scalar(Value),
    Set(Vec<Value>),
}

impl StateValue {
    /// Value of a register that was never written under `policy`
    pub fn default_for(policy: Policy) -> Self {
        if policy.is_scalar() {
            StateValue::Scalar(Value::Null)
        } else {
            StateValue::Set(Vec::new())
        }
    }

    /// The scalar value, if this is a non-null scalar
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            StateValue::Scalar(Value::Null) | StateValue::Set(_) => None,
            StateValue::Scalar(value) => Some(value),
        }
    }

    /// The set members, if this is a set
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            StateValue::Set(values) => Some(values),
            StateValue::Scalar(_) => None,
        }
    }

    /// True when nothing is held (null scalar or empty set)
    pub fn is_empty(&self) -> bool {
        match self {
            StateValue::Scalar(value) => value.is_null(),
            StateValue::Set(values) => values.is_empty(),
        }
    }

    /// Whether this value counts as an actual answer
    ///
    /// Scalars are falsy when null, `false`, zero or the empty string.
    /// Sets always count, even when empty.
    pub fn is_meaningful(&self) -> bool {
        match self {
            StateValue::Scalar(value) => !is_falsy(value),
            StateValue::Set(_) => true,
        }
    }

    /// Convert into a plain JSON value
    pub fn into_json(self) -> Value {
        match self {
            StateValue::Scalar(value) => value,
            StateValue::Set(values) => Value::Array(values),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// One identity's value for a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityState {
    pub identity: IdentityId,
    pub value: StateValue,
}

impl IdentityState {
    pub fn new(identity: impl Into<IdentityId>, value: StateValue) -> Self {
        Self {
            identity: identity.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        assert_eq!(
            StateValue::default_for(Policy::LastWriterWins),
            StateValue::Scalar(Value::Null)
        );
        assert_eq!(StateValue::default_for(Policy::Set), StateValue::Set(vec![]));
        assert!(StateValue::default_for(Policy::Set).is_empty());
    }

    #[test]
    fn test_meaningful_scalars() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!StateValue::Scalar(falsy).is_meaningful());
        }
        for truthy in [json!(true), json!(3), json!("a"), json!([]), json!({})] {
            assert!(StateValue::Scalar(truthy).is_meaningful());
        }
        assert!(StateValue::Set(vec![]).is_meaningful());
    }

    #[test]
    fn test_serializes_untagged() {
        let state = IdentityState::new("alice", StateValue::Set(vec![json!("a")]));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"identity": "alice", "value": ["a"]})
        );
        assert_eq!(StateValue::Scalar(json!(3)).into_json(), json!(3));
    }
}
