//! Single-Actor Register: one identity's value for one field
//!
//! A state-based CRDT over an operation log. The log is a grow-only map of
//! add operations (`OpId -> value`) plus a grow-only set of retracted add IDs.
//! The current value is a pure function of the log and the policy:
//!
//! | Policy | Current value |
//! |---|---|
//! | `FirstWriterWins` | value of the smallest add ID (retractions ignored) |
//! | `LastWriterWins` | value of the greatest add ID (retractions ignored) |
//! | `LastWriterWinsNullable` | value of the greatest live add ID, or null |
//! | `Set` | distinct values of live adds, ordered by first live add ID |
//!
//! # Properties
//!
//! - **Commutativity:** the log is a union of sets, so arrival order is irrelevant
//! - **Idempotence:** re-inserting a known ID changes nothing
//!
//! # Example
//!
//! ```
//! use response_crdt::crdt::{Policy, Register, StateValue};
//! use response_crdt::op::{LamportIdGenerator, OpIdGenerator};
//! use serde_json::json;
//!
//! let mut ids = LamportIdGenerator::new();
//! let mut register = Register::new("choice", Policy::Set);
//!
//! register.add(json!("a"), || ids.next_id());
//! register.add(json!("a"), || ids.next_id());
//! register.remove(&json!("a"));
//!
//! assert_eq!(register.get_value(), &StateValue::Set(vec![]));
//! ```

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::{Policy, StateValue};
use crate::error::{Result, SummaryError};
use crate::op::OpId;
use crate::protocol::FieldDelta;
use crate::FieldName;

/// Operation log and resolved value for one identity and one field
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    field: FieldName,
    policy: Policy,

    /// Every add ever applied
    adds: BTreeMap<OpId, Value>,

    /// Add IDs that have been retracted
    removes: BTreeSet<OpId>,

    /// Cached resolution of the log
    current: StateValue,

    /// Local operations not yet handed to the transport
    pending_adds: BTreeSet<OpId>,
    pending_removes: BTreeSet<OpId>,
}

impl Register {
    /// Create an empty register for `field` under `policy`
    pub fn new(field: impl Into<FieldName>, policy: Policy) -> Self {
        Self {
            field: field.into(),
            policy,
            adds: BTreeMap::new(),
            removes: BTreeSet::new(),
            current: StateValue::default_for(policy),
            pending_adds: BTreeSet::new(),
            pending_removes: BTreeSet::new(),
        }
    }

    pub fn field(&self) -> &FieldName {
        &self.field
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Current value (null or empty set when never written)
    pub fn get_value(&self) -> &StateValue {
        &self.current
    }

    /// Number of add operations in the log
    pub fn op_count(&self) -> usize {
        self.adds.len()
    }

    /// Apply a local add
    ///
    /// `next_id` is only called when the add actually produces an operation.
    /// Returns whether an operation was recorded. Adding `null` is a no-op;
    /// clearing a value is expressed with [`Register::remove`].
    pub fn add(&mut self, value: Value, next_id: impl FnOnce() -> OpId) -> bool {
        if value.is_null() {
            return false;
        }

        let should_add = match self.policy {
            Policy::FirstWriterWins => self.current.is_empty(),
            Policy::LastWriterWins | Policy::LastWriterWinsNullable => true,
            Policy::Set => !self.live_adds().any(|(_, v)| *v == value),
        };
        if !should_add {
            return false;
        }

        let id = next_id();
        self.adds.insert(id, value);
        self.pending_adds.insert(id);
        self.resolve();
        true
    }

    /// Apply a local remove
    ///
    /// Removes carry no new ID: they retract the IDs of the adds they observed.
    /// Returns whether any add was retracted. Removing a value that is not
    /// present is a no-op, as is any remove under the non-nullable scalar
    /// policies.
    pub fn remove(&mut self, value: &Value) -> bool {
        let retracted: Vec<OpId> = match self.policy {
            Policy::FirstWriterWins | Policy::LastWriterWins => Vec::new(),
            Policy::LastWriterWinsNullable => {
                if self.current.as_scalar() == Some(value) {
                    // Retract every observed add so no older value resurfaces
                    self.live_adds().map(|(id, _)| *id).collect()
                } else {
                    Vec::new()
                }
            }
            Policy::Set => self
                .live_adds()
                .filter(|(_, v)| *v == value)
                .map(|(id, _)| *id)
                .collect(),
        };

        if retracted.is_empty() {
            return false;
        }

        for id in retracted {
            self.removes.insert(id);
            self.pending_removes.insert(id);
        }
        self.resolve();
        true
    }

    /// Check that `delta` is well-formed and consistent with this log
    pub fn check(&self, delta: &FieldDelta) -> Result<()> {
        delta.validate()?;

        for entry in &delta.adds {
            for id in &entry.ids {
                if let Some(known) = self.adds.get(id) {
                    if known != &entry.value {
                        return Err(SummaryError::malformed(format!(
                            "op id {} for field `{}` was already applied with value {}, got {}",
                            id, self.field, known, entry.value
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Merge a delta into the log
    ///
    /// Safe to call any number of times, in any order, with overlapping
    /// deltas. Returns whether the resolved value changed.
    pub fn synchronize(&mut self, delta: &FieldDelta) -> Result<bool> {
        self.check(delta)?;
        Ok(self.merge_checked(delta))
    }

    /// Merge a delta that already passed [`Register::check`]
    pub(crate) fn merge_checked(&mut self, delta: &FieldDelta) -> bool {
        let mut new_ops = 0usize;

        for entry in &delta.adds {
            for id in &entry.ids {
                if !self.adds.contains_key(id) {
                    self.adds.insert(*id, entry.value.clone());
                    new_ops += 1;
                }
            }
        }
        for id in &delta.removes {
            if self.removes.insert(*id) {
                new_ops += 1;
            }
        }

        if new_ops == 0 {
            return false;
        }

        let before = self.current.clone();
        self.resolve();

        tracing::trace!(
            field = %self.field,
            policy = %self.policy,
            new_ops,
            "applied register delta"
        );

        before != self.current
    }

    /// The full operation log in wire form
    pub fn delta(&self) -> FieldDelta {
        self.build_delta(self.adds.keys(), self.removes.iter())
    }

    /// Local operations not yet handed to the transport
    pub fn pending(&self) -> FieldDelta {
        self.build_delta(self.pending_adds.iter(), self.pending_removes.iter())
    }

    /// Drain local operations not yet handed to the transport
    pub fn take_pending(&mut self) -> FieldDelta {
        let delta = self.pending();
        self.pending_adds.clear();
        self.pending_removes.clear();
        delta
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_adds.is_empty() || !self.pending_removes.is_empty()
    }

    fn build_delta<'a>(
        &self,
        adds: impl Iterator<Item = &'a OpId>,
        removes: impl Iterator<Item = &'a OpId>,
    ) -> FieldDelta {
        let mut delta = FieldDelta::new();
        for id in adds {
            if let Some(value) = self.adds.get(id) {
                delta.push_add(value.clone(), *id);
            }
        }
        delta.removes = removes.copied().collect();
        delta
    }

    fn live_adds(&self) -> impl Iterator<Item = (&OpId, &Value)> {
        self.adds
            .iter()
            .filter(|(id, _)| !self.removes.contains(*id))
    }

    fn resolve(&mut self) {
        self.current = match self.policy {
            Policy::FirstWriterWins => scalar(self.adds.values().next()),
            Policy::LastWriterWins => scalar(self.adds.values().next_back()),
            Policy::LastWriterWinsNullable => scalar(self.live_adds().map(|(_, v)| v).last()),
            Policy::Set => {
                let mut values: Vec<Value> = Vec::new();
                for (_, value) in self.live_adds() {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
                StateValue::Set(values)
            }
        };
    }
}

fn scalar(value: Option<&Value>) -> StateValue {
    StateValue::Scalar(value.cloned().unwrap_or(Value::Null))
}
