//! Wire shapes exchanged with the transport
//!
//! ```text
//! { <identity>: { <field>: { "adds": [ {"value": v, "ids": [opId, ...]} ], "removes": [opId, ...] } } }
//! ```
//!
//! Inbound and outbound payloads share exactly this shape.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, SummaryError};
use crate::op::OpId;
use crate::{FieldName, IdentityId};

/// One value added under one or more operation IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEntry {
    pub value: Value,
    pub ids: Vec<OpId>,
}

/// Operations for one identity and one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDelta {
    #[serde(default)]
    pub adds: Vec<AddEntry>,

    /// IDs of add operations being retracted
    #[serde(default)]
    pub removes: Vec<OpId>,
}

impl FieldDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    /// Append an add, grouping IDs under an existing entry for the same value
    pub fn push_add(&mut self, value: Value, id: OpId) {
        match self.adds.iter_mut().find(|entry| entry.value == value) {
            Some(entry) => entry.ids.push(id),
            None => self.adds.push(AddEntry {
                value,
                ids: vec![id],
            }),
        }
    }

    /// Every operation ID mentioned by this delta
    pub fn op_ids(&self) -> impl Iterator<Item = &OpId> {
        self.adds
            .iter()
            .flat_map(|entry| entry.ids.iter())
            .chain(self.removes.iter())
    }

    /// Check the structural rules a JSON schema cannot express
    ///
    /// Every add carries at least one ID and a non-null value, no ID is
    /// attached to two different values, and every clock leaves room for
    /// the local clock to tick past it.
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = self.op_ids().find(|id| id.clock == OpId::MAX_CLOCK) {
            return Err(SummaryError::malformed(format!(
                "op id {} has an exhausted clock",
                id
            )));
        }

        let mut seen: BTreeMap<&OpId, &Value> = BTreeMap::new();

        for entry in &self.adds {
            if entry.ids.is_empty() {
                return Err(SummaryError::malformed(format!(
                    "add of {} carries no op ids",
                    entry.value
                )));
            }
            if entry.value.is_null() {
                return Err(SummaryError::malformed("add carries a null value"));
            }
            for id in &entry.ids {
                if let Some(previous) = seen.insert(id, &entry.value) {
                    if previous != &entry.value {
                        return Err(SummaryError::malformed(format!(
                            "op id {} is attached to both {} and {}",
                            id, previous, entry.value
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Deltas for one field, keyed by identity
pub type IdentityDeltas = BTreeMap<IdentityId, FieldDelta>;

/// A full payload: identity -> field -> delta
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResponsePart {
    identities: BTreeMap<IdentityId, BTreeMap<FieldName, FieldDelta>>,
}

impl<'de> Deserialize<'de> for ResponsePart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let UniqueMap(identities) = UniqueMap::<UniqueMap<FieldDelta>>::deserialize(deserializer)?;
        Ok(Self {
            identities: identities
                .into_iter()
                .map(|(identity, UniqueMap(fields))| (identity, fields))
                .collect(),
        })
    }
}

/// String-keyed map that refuses repeated keys instead of keeping the last
struct UniqueMap<V>(BTreeMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct UniqueMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
            type Value = UniqueMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with unique keys")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = BTreeMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    if map.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    let value = access.next_value()?;
                    map.insert(key, value);
                }
                Ok(UniqueMap(map))
            }
        }

        deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
    }
}

impl ResponsePart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (replacing) the delta for one identity and field
    pub fn insert(
        &mut self,
        identity: impl Into<IdentityId>,
        field: impl Into<FieldName>,
        delta: FieldDelta,
    ) {
        self.identities
            .entry(identity.into())
            .or_default()
            .insert(field.into(), delta);
    }

    pub fn get(&self, identity: &str, field: &str) -> Option<&FieldDelta> {
        self.identities.get(identity)?.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.identities
            .values()
            .all(|fields| fields.values().all(FieldDelta::is_empty))
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn identities(&self) -> impl Iterator<Item = &IdentityId> {
        self.identities.keys()
    }

    /// Distinct field names mentioned anywhere in the payload
    pub fn field_names(&self) -> Vec<&FieldName> {
        let mut names: Vec<&FieldName> = self
            .identities
            .values()
            .flat_map(|fields| fields.keys())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// The per-identity slice for one field
    pub fn field_slice(&self, field: &str) -> IdentityDeltas {
        self.identities
            .iter()
            .filter_map(|(identity, fields)| {
                fields
                    .get(field)
                    .map(|delta| (identity.clone(), delta.clone()))
            })
            .collect()
    }

    /// Every operation ID mentioned by the payload
    pub fn op_ids(&self) -> impl Iterator<Item = &OpId> {
        self.identities
            .values()
            .flat_map(|fields| fields.values())
            .flat_map(FieldDelta::op_ids)
    }

    pub fn validate(&self) -> Result<()> {
        for (identity, fields) in &self.identities {
            for (field, delta) in fields {
                delta.validate().map_err(|e| match e {
                    SummaryError::MalformedDelta(msg) => {
                        SummaryError::malformed(format!("{}/{}: {}", identity, field, msg))
                    }
                    other => other,
                })?;
            }
        }
        Ok(())
    }
}
