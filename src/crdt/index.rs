//! Multi-Identity State Index: one register per participant for one field
//!
//! Registers are created lazily, on the first local write, explicit
//! registration or ingested delta for an identity. Reads never create them,
//! and they are never removed.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{IdentityState, Policy, Register, StateValue};
use crate::error::Result;
use crate::op::{LocalActor, OpIdGenerator};
use crate::protocol::{FieldDelta, IdentityDeltas};
use crate::{FieldName, IdentityId};

/// Registers for every identity that has touched one field
#[derive(Debug, Clone, PartialEq)]
pub struct StateIndex {
    field: FieldName,
    policy: Policy,
    registers: BTreeMap<IdentityId, Register>,
}

impl StateIndex {
    pub fn new(field: impl Into<FieldName>, policy: Policy) -> Self {
        Self {
            field: field.into(),
            policy,
            registers: BTreeMap::new(),
        }
    }

    pub fn field(&self) -> &FieldName {
        &self.field
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Number of identities with a register
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.registers.contains_key(identity)
    }

    /// Identities with a register, in sorted order
    pub fn identities(&self) -> impl Iterator<Item = &IdentityId> {
        self.registers.keys()
    }

    pub fn register(&self, identity: &str) -> Option<&Register> {
        self.registers.get(identity)
    }

    /// Create an empty register for `identity` if it has none
    pub fn register_identity(&mut self, identity: impl Into<IdentityId>) -> &mut Register {
        let field = &self.field;
        let policy = self.policy;
        self.registers
            .entry(identity.into())
            .or_insert_with(|| Register::new(field.clone(), policy))
    }

    /// Add a value as the local identity
    pub fn add_value<G: OpIdGenerator>(&mut self, actor: &mut LocalActor<G>, value: Value) -> bool {
        let register = self.register_identity(actor.identity().clone());
        register.add(value, || actor.next_id())
    }

    /// Remove a value as the local identity
    pub fn remove_value<G: OpIdGenerator>(
        &mut self,
        actor: &LocalActor<G>,
        value: &Value,
    ) -> bool {
        let register = self.register_identity(actor.identity().clone());
        register.remove(value)
    }

    /// Value for `identity`, or the policy default if it has no register
    pub fn get_value(&self, identity: &str) -> StateValue {
        self.registers
            .get(identity)
            .map(|register| register.get_value().clone())
            .unwrap_or_else(|| StateValue::default_for(self.policy))
    }

    /// Values for the identities that have a register, in input order
    pub fn get_values<I: AsRef<str>>(&self, identities: &[I]) -> Vec<IdentityState> {
        identities
            .iter()
            .filter_map(|identity| {
                let identity = identity.as_ref();
                self.registers
                    .get(identity)
                    .map(|register| IdentityState::new(identity, register.get_value().clone()))
            })
            .collect()
    }

    /// Check every identity's delta against its register without applying
    pub fn check(&self, payload: &IdentityDeltas) -> Result<()> {
        for (identity, delta) in payload {
            match self.registers.get(identity) {
                Some(register) => register.check(delta)?,
                None => delta.validate()?,
            }
        }
        Ok(())
    }

    /// Route each identity's delta to that identity's register
    ///
    /// Either the whole payload applies or none of it does. Returns the
    /// number of identities whose value changed.
    pub fn synchronize(&mut self, payload: &IdentityDeltas) -> Result<usize> {
        self.check(payload)?;
        Ok(self.merge_checked(payload))
    }

    pub(crate) fn merge_checked(&mut self, payload: &IdentityDeltas) -> usize {
        let mut changed = 0;
        for (identity, delta) in payload {
            if self.register_identity(identity.clone()).merge_checked(delta) {
                changed += 1;
            }
        }
        changed
    }

    /// Full operation logs of every register
    pub fn snapshot(&self) -> IdentityDeltas {
        self.registers
            .iter()
            .map(|(identity, register)| (identity.clone(), register.delta()))
            .collect()
    }

    /// Drain un-sent local operations for `identity`
    pub fn take_pending(&mut self, identity: &str) -> Option<FieldDelta> {
        self.registers
            .get_mut(identity)
            .filter(|register| register.has_pending())
            .map(Register::take_pending)
    }

    /// Un-sent local operations for `identity`
    pub fn pending(&self, identity: &str) -> Option<FieldDelta> {
        self.registers
            .get(identity)
            .filter(|register| register.has_pending())
            .map(Register::pending)
    }
}
