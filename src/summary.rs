//! Response Summary: the per-object facade over all response fields
//!
//! Owns one [`StateIndex`] per registered field and translates between
//! register operation logs and the wire payload.
//!
//! # Example
//!
//! ```
//! use response_crdt::{LocalActor, Policy, ResponseSummary};
//! use serde_json::json;
//!
//! let mut alice = ResponseSummary::new(LocalActor::new("alice"));
//! alice.register_state("rating", Policy::FirstWriterWins).unwrap();
//! alice.add_state("rating", json!(3)).unwrap();
//!
//! let mut bob = ResponseSummary::new(LocalActor::new("bob"));
//! bob.register_state("rating", Policy::FirstWriterWins).unwrap();
//! bob.parse_response_part(&alice.take_pending_response_part()).unwrap();
//!
//! let states = bob.get_states("rating", &["alice", "bob"]).unwrap();
//! assert_eq!(states.len(), 1);
//! assert_eq!(states[0].value.as_scalar(), Some(&json!(3)));
//! ```

use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::SummaryConfig;
use crate::crdt::{IdentityState, Policy, StateIndex, StateValue};
use crate::error::{Result, SummaryError};
use crate::op::{LamportIdGenerator, LocalActor, OpIdGenerator};
use crate::protocol::ResponsePart;
use crate::{FieldName, IdentityId};

/// Response state attached to one interactive object
#[derive(Debug, Clone)]
pub struct ResponseSummary<G = LamportIdGenerator> {
    actor: LocalActor<G>,
    fields: BTreeMap<FieldName, StateIndex>,
}

impl<G: OpIdGenerator> ResponseSummary<G> {
    /// Create a summary with no registered fields
    pub fn new(actor: LocalActor<G>) -> Self {
        Self {
            actor,
            fields: BTreeMap::new(),
        }
    }

    /// Create a summary and register every field in `config`
    pub fn from_config(actor: LocalActor<G>, config: &SummaryConfig) -> Result<Self> {
        let mut summary = Self::new(actor);
        for field in &config.fields {
            summary.register_state(field.name.clone(), field.policy()?)?;
        }
        Ok(summary)
    }

    /// Identity local writes are attributed to
    pub fn local_identity(&self) -> &IdentityId {
        self.actor.identity()
    }

    pub fn actor(&self) -> &LocalActor<G> {
        &self.actor
    }

    /// Declare a field and its merge policy
    ///
    /// Registering the same field again with the same policy is a no-op;
    /// with a different policy it fails.
    pub fn register_state(&mut self, field: impl Into<FieldName>, policy: Policy) -> Result<()> {
        let field = field.into();

        if let Some(existing) = self.fields.get(&field) {
            if existing.policy() == policy {
                return Ok(());
            }
            return Err(SummaryError::PolicyConflict {
                field,
                existing: existing.policy(),
                requested: policy,
            });
        }

        tracing::debug!(field = %field, policy = %policy, "registered response field");
        self.fields
            .insert(field.clone(), StateIndex::new(field, policy));
        Ok(())
    }

    /// Declare a field by policy wire name
    pub fn register_state_named(&mut self, field: impl Into<FieldName>, policy: &str) -> Result<()> {
        self.register_state(field, policy.parse()?)
    }

    /// Policy of a registered field
    pub fn policy(&self, field: &str) -> Option<Policy> {
        self.fields.get(field).map(StateIndex::policy)
    }

    /// Registered field names, sorted
    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.keys()
    }

    /// The index backing a registered field
    pub fn index(&self, field: &str) -> Result<&StateIndex> {
        self.fields
            .get(field)
            .ok_or_else(|| SummaryError::UnregisteredField(field.to_string()))
    }

    /// Write a value for the local identity
    ///
    /// Returns whether an operation was recorded (writes the policy ignores
    /// record nothing).
    pub fn add_state(&mut self, field: &str, value: Value) -> Result<bool> {
        let index = self
            .fields
            .get_mut(field)
            .ok_or_else(|| SummaryError::UnregisteredField(field.to_string()))?;
        Ok(index.add_value(&mut self.actor, value))
    }

    /// Remove a value for the local identity
    pub fn remove_state(&mut self, field: &str, value: &Value) -> Result<bool> {
        let index = self
            .fields
            .get_mut(field)
            .ok_or_else(|| SummaryError::UnregisteredField(field.to_string()))?;
        Ok(index.remove_value(&self.actor, value))
    }

    /// One identity's value for a field
    pub fn get_state(&self, field: &str, identity: &str) -> Result<StateValue> {
        Ok(self.index(field)?.get_value(identity))
    }

    /// The local identity's value for a field
    pub fn get_local_state(&self, field: &str) -> Result<StateValue> {
        self.get_state(field, self.actor.identity())
    }

    /// Identities that actually answered, in input order
    ///
    /// Unlike [`StateIndex::get_values`], scalar entries whose value is falsy
    /// are dropped. Set entries are kept even when empty.
    pub fn get_states<I: AsRef<str>>(
        &self,
        field: &str,
        identities: &[I],
    ) -> Result<Vec<IdentityState>> {
        Ok(self
            .index(field)?
            .get_values(identities)
            .into_iter()
            .filter(|state| state.value.is_meaningful())
            .collect())
    }

    /// Ingest an inbound payload
    ///
    /// Every field in the payload must be registered and every delta must be
    /// consistent with local state; otherwise nothing is applied. Returns the
    /// number of (identity, field) values that changed.
    pub fn parse_response_part(&mut self, part: &ResponsePart) -> Result<usize> {
        if let Err(err) = self.check_response_part(part) {
            tracing::warn!(error = %err, "rejected response payload");
            return Err(err);
        }

        for id in part.op_ids() {
            self.actor.observe(id);
        }

        let mut changed = 0;
        for (field, index) in self.fields.iter_mut() {
            let slice = part.field_slice(field);
            if !slice.is_empty() {
                changed += index.merge_checked(&slice);
            }
        }

        tracing::debug!(
            identities = part.identity_count(),
            changed,
            "ingested response payload"
        );
        Ok(changed)
    }

    /// Ingest an inbound payload from its JSON text
    pub fn parse_response_part_json(&mut self, json: &str) -> Result<usize> {
        let part = match ResponsePart::from_json_str(json) {
            Ok(part) => part,
            Err(err) => {
                tracing::warn!(error = %err, "rejected response payload");
                return Err(err);
            }
        };
        self.parse_response_part(&part)
    }

    fn check_response_part(&self, part: &ResponsePart) -> Result<()> {
        part.validate()?;
        for field in part.field_names() {
            let index = self.index(field)?;
            index.check(&part.field_slice(field))?;
        }
        Ok(())
    }

    /// Local operations not yet handed to the transport
    pub fn pending_response_part(&self) -> ResponsePart {
        let identity = self.actor.identity();
        let mut part = ResponsePart::new();
        for (field, index) in &self.fields {
            if let Some(delta) = index.pending(identity) {
                part.insert(identity.clone(), field.clone(), delta);
            }
        }
        part
    }

    /// Drain local operations not yet handed to the transport
    pub fn take_pending_response_part(&mut self) -> ResponsePart {
        let identity = self.actor.identity().clone();
        let mut part = ResponsePart::new();
        for (field, index) in self.fields.iter_mut() {
            if let Some(delta) = index.take_pending(&identity) {
                part.insert(identity.clone(), field.clone(), delta);
            }
        }
        part
    }

    /// Full state of every identity and field, in wire form
    pub fn snapshot(&self) -> ResponsePart {
        let mut part = ResponsePart::new();
        for (field, index) in &self.fields {
            for (identity, delta) in index.snapshot() {
                part.insert(identity, field.clone(), delta);
            }
        }
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FieldDelta;
    use serde_json::json;
    use uuid::Uuid;

    fn summary(identity: &str, n: u128) -> ResponseSummary {
        ResponseSummary::new(LocalActor::with_generator(
            identity,
            LamportIdGenerator::with_replica(Uuid::from_u128(n)),
        ))
    }

    #[test]
    fn test_register_state_idempotent() {
        let mut s = summary("alice", 1);
        s.register_state("rating", Policy::FirstWriterWins).unwrap();
        s.register_state("rating", Policy::FirstWriterWins).unwrap();
        assert_eq!(s.fields().count(), 1);

        let err = s.register_state("rating", Policy::Set).unwrap_err();
        assert!(matches!(err, SummaryError::PolicyConflict { .. }));
        assert_eq!(s.policy("rating"), Some(Policy::FirstWriterWins));
    }

    #[test]
    fn test_register_state_named() {
        let mut s = summary("alice", 1);
        s.register_state_named("choices", "SET").unwrap();
        assert_eq!(s.policy("choices"), Some(Policy::Set));

        let err = s.register_state_named("other", "BOGUS").unwrap_err();
        assert!(matches!(err, SummaryError::InvalidPolicy(_)));
        assert_eq!(s.policy("other"), None);
    }

    #[test]
    fn test_unregistered_field_guard() {
        let mut s = summary("alice", 1);
        let err = |r: Result<()>| matches!(r, Err(SummaryError::UnregisteredField(f)) if f == "nope");

        assert!(err(s.add_state("nope", json!(1)).map(|_| ())));
        assert!(err(s.remove_state("nope", &json!(1)).map(|_| ())));
        assert!(err(s.get_state("nope", "alice").map(|_| ())));
        assert!(err(s.get_states("nope", &["alice"]).map(|_| ())));

        let mut part = ResponsePart::new();
        part.insert("bob", "nope", FieldDelta::new());
        assert!(err(s.parse_response_part(&part).map(|_| ())));
    }

    #[test]
    fn test_local_write_and_read() {
        let mut s = summary("alice", 1);
        s.register_state("comment", Policy::LastWriterWinsNullable)
            .unwrap();

        assert!(s.add_state("comment", json!("hi")).unwrap());
        assert_eq!(
            s.get_local_state("comment").unwrap(),
            StateValue::Scalar(json!("hi"))
        );

        assert!(s.remove_state("comment", &json!("hi")).unwrap());
        assert_eq!(
            s.get_state("comment", "alice").unwrap(),
            StateValue::Scalar(json!(null))
        );
    }

    #[test]
    fn test_get_states_drops_falsy_scalars() {
        let mut s = summary("alice", 1);
        s.register_state("comment", Policy::LastWriterWinsNullable)
            .unwrap();
        s.register_state("choices", Policy::Set).unwrap();

        s.add_state("comment", json!("x")).unwrap();
        s.remove_state("comment", &json!("x")).unwrap();
        s.remove_state("choices", &json!("a")).unwrap();

        assert_eq!(s.index("comment").unwrap().get_values(&["alice"]).len(), 1);
        assert!(s.get_states("comment", &["alice"]).unwrap().is_empty());

        // Sets are reported even when empty
        assert_eq!(s.get_states("choices", &["alice"]).unwrap().len(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = SummaryConfig::new()
            .with_field("rating", Policy::FirstWriterWins)
            .with_field("choices", Policy::Set);
        let s = ResponseSummary::from_config(LocalActor::new("alice"), &config).unwrap();
        assert_eq!(s.fields().collect::<Vec<_>>(), vec!["choices", "rating"]);

        let mut bad = SummaryConfig::new().with_field("rating", Policy::Set);
        bad.fields[0].policy = "ALWAYS_YES".to_string();
        assert!(matches!(
            ResponseSummary::from_config(LocalActor::new("alice"), &bad),
            Err(SummaryError::InvalidPolicy(_))
        ));

        let conflicting = SummaryConfig::new()
            .with_field("rating", Policy::FirstWriterWins)
            .with_field("rating", Policy::LastWriterWins);
        assert!(matches!(
            ResponseSummary::from_config(LocalActor::new("alice"), &conflicting),
            Err(SummaryError::PolicyConflict { .. })
        ));
    }

    #[test]
    fn test_rating_scenario_any_order() {
        let mut remote = summary("bob", 2);
        remote
            .register_state("rating", Policy::FirstWriterWins)
            .unwrap();
        remote.add_state("rating", json!(5)).unwrap();
        let delta = remote.take_pending_response_part();

        // Local write before the remote delta
        let mut before = summary("alice", 1);
        before
            .register_state("rating", Policy::FirstWriterWins)
            .unwrap();
        before.add_state("rating", json!(3)).unwrap();
        before.parse_response_part(&delta).unwrap();

        // Remote delta before the local write
        let mut after = summary("alice", 1);
        after
            .register_state("rating", Policy::FirstWriterWins)
            .unwrap();
        after.parse_response_part(&delta).unwrap();
        after.add_state("rating", json!(3)).unwrap();

        let expected = vec![
            IdentityState::new("alice", StateValue::Scalar(json!(3))),
            IdentityState::new("bob", StateValue::Scalar(json!(5))),
        ];
        assert_eq!(
            before.get_states("rating", &["alice", "bob"]).unwrap(),
            expected
        );
        assert_eq!(
            after.get_states("rating", &["alice", "bob"]).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_is_atomic_across_fields() {
        let mut s = summary("alice", 1);
        s.register_state("rating", Policy::FirstWriterWins).unwrap();

        let mut part = ResponsePart::new();
        let mut delta = FieldDelta::new();
        delta.push_add(json!(4), crate::op::OpId::new(1, Uuid::from_u128(2)));
        part.insert("bob", "rating", delta);
        part.insert("bob", "unknown", FieldDelta::new());

        assert!(s.parse_response_part(&part).is_err());
        assert!(!s.index("rating").unwrap().contains("bob"));
    }

    #[test]
    fn test_ingest_advances_local_clock() {
        let mut s = summary("alice", 1);
        s.register_state("comment", Policy::LastWriterWins).unwrap();

        let mut part = ResponsePart::new();
        let mut delta = FieldDelta::new();
        delta.push_add(json!("remote"), crate::op::OpId::new(50, Uuid::from_u128(2)));
        part.insert("alice", "comment", delta);
        s.parse_response_part(&part).unwrap();
        assert_eq!(
            s.get_local_state("comment").unwrap(),
            StateValue::Scalar(json!("remote"))
        );

        // A later local write sorts after everything already seen
        s.add_state("comment", json!("local")).unwrap();
        assert_eq!(
            s.get_local_state("comment").unwrap(),
            StateValue::Scalar(json!("local"))
        );
        assert_eq!(s.actor().generator().clock(), 51);
    }

    #[test]
    fn test_exhausted_remote_clock_leaves_local_writes_working() {
        let mut s = summary("alice", 1);
        s.register_state("comment", Policy::LastWriterWins).unwrap();

        let mut part = ResponsePart::new();
        let mut delta = FieldDelta::new();
        delta.push_add(json!("remote"), crate::op::OpId::new(u64::MAX, Uuid::from_u128(2)));
        part.insert("alice", "comment", delta);

        assert!(matches!(
            s.parse_response_part(&part),
            Err(SummaryError::MalformedDelta(_))
        ));
        assert_eq!(s.actor().generator().clock(), 0);

        s.add_state("comment", json!("local")).unwrap();
        assert_eq!(
            s.get_local_state("comment").unwrap(),
            StateValue::Scalar(json!("local"))
        );
    }

    #[test]
    fn test_pending_and_snapshot() {
        let mut s = summary("alice", 1);
        s.register_state("choices", Policy::Set).unwrap();
        s.register_state("rating", Policy::FirstWriterWins).unwrap();
        s.add_state("choices", json!("a")).unwrap();
        s.add_state("rating", json!(2)).unwrap();

        let pending = s.pending_response_part();
        assert_eq!(pending, s.take_pending_response_part());
        assert!(pending.get("alice", "choices").is_some());
        assert!(s.take_pending_response_part().is_empty());

        let mut fresh = summary("carol", 3);
        fresh.register_state("choices", Policy::Set).unwrap();
        fresh.register_state("rating", Policy::FirstWriterWins).unwrap();
        fresh.parse_response_part(&s.snapshot()).unwrap();

        for field in ["choices", "rating"] {
            assert_eq!(
                fresh.get_state(field, "alice").unwrap(),
                s.get_state(field, "alice").unwrap()
            );
        }
    }

    #[test]
    fn test_parse_json_payload() {
        let mut s = summary("alice", 1);
        s.register_state("choices", Policy::Set).unwrap();

        let json = r#"{"bob": {"choices": {"adds": [{"value": "x", "ids": ["1@00000000-0000-0000-0000-000000000002"]}], "removes": []}}}"#;
        assert_eq!(s.parse_response_part_json(json).unwrap(), 1);
        assert_eq!(
            s.get_state("choices", "bob").unwrap(),
            StateValue::Set(vec![json!("x")])
        );

        assert!(matches!(
            s.parse_response_part_json(r#"{"bob": 1}"#),
            Err(SummaryError::MalformedDelta(_))
        ));
    }
}
