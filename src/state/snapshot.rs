//! Point-in-time snapshots of every slot.

use crate::error::{ContainerError, Result};
use crate::types::{json_kind, ChangeSet, SlotChange, SlotMap, SlotValue};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An immutable mapping from every slot key to its value.
///
/// Cloning is O(1). A snapshot is never modified after creation; every
/// mutation of the container produces a new one.
#[derive(Clone)]
pub struct Snapshot {
    slots: Arc<SlotMap>,
}

impl Snapshot {
    pub(crate) fn from_slots(slots: SlotMap) -> Self {
        Self {
            slots: Arc::new(slots),
        }
    }

    /// Build a snapshot from a JSON object. Each top-level field is a slot.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_slots(
                map.into_iter()
                    .map(|(k, v)| (k, SlotValue::from(v)))
                    .collect(),
            )),
            other => Err(ContainerError::InvalidPayload(format!(
                "initial state must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SlotValue> {
        self.slots.get(key)
    }

    /// Like `get`, but an undeclared key is an error.
    pub fn require(&self, key: &str) -> Result<&SlotValue> {
        self.slots
            .get(key)
            .ok_or_else(|| ContainerError::KeyNotFound(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// True if both handles point at the same snapshot object.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }

    /// Collect the values of `keys`. Fails on the first undeclared key.
    pub fn pick<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<SlotMap> {
        keys.into_iter()
            .map(|key| Ok((key.to_string(), self.require(key)?.clone())))
            .collect()
    }

    /// Materialize the snapshot as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.slots
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    /// Decode the whole snapshot into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_value())
            .map_err(|e| ContainerError::Deserialization(e.to_string()))
    }

    /// Slots whose values differ between `self` and `next` under shallow
    /// equality, in key order.
    pub fn diff(&self, next: &Snapshot) -> ChangeSet {
        if self.ptr_eq(next) {
            return ChangeSet::default();
        }

        let changes = self
            .slots
            .iter()
            .filter_map(|(key, old)| {
                let new = next.slots.get(key)?;
                if old.same(new) {
                    None
                } else {
                    Some(SlotChange {
                        key: key.clone(),
                        old: old.clone(),
                        new: new.clone(),
                    })
                }
            })
            .collect();

        ChangeSet::new(changes)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slots.iter()).finish()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.slots.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        Snapshot::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_requires_object() {
        let result = Snapshot::from_value(json!(42));
        assert!(matches!(result, Err(ContainerError::InvalidPayload(_))));
    }

    #[test]
    fn test_require_unknown_key() {
        let snap = snapshot(json!({"counter": 0}));
        assert!(snap.require("counter").is_ok());
        assert!(matches!(
            snap.require("missing"),
            Err(ContainerError::KeyNotFound(k)) if k == "missing"
        ));
    }

    #[test]
    fn test_diff_reports_changed_primitives() {
        let old = snapshot(json!({"counter": 0, "theme": "light"}));
        let mut slots = old.slots().clone();
        slots.insert("counter".into(), SlotValue::new(1));
        slots.insert("theme".into(), SlotValue::new("light"));
        let new = Snapshot::from_slots(slots);

        let changes = old.diff(&new);
        assert_eq!(changes.len(), 1);
        let change = changes.get("counter").unwrap();
        assert_eq!(change.old, json!(0));
        assert_eq!(change.new, json!(1));
    }

    #[test]
    fn test_diff_treats_new_object_as_change() {
        let old = snapshot(json!({"user": {"name": "John"}}));
        let mut slots = old.slots().clone();
        slots.insert("user".into(), SlotValue::new(json!({"name": "John"})));
        let new = Snapshot::from_slots(slots);

        assert!(old.diff(&new).contains("user"));
    }

    #[test]
    fn test_diff_same_snapshot_is_empty() {
        let snap = snapshot(json!({"counter": 0}));
        assert!(snap.diff(&snap.clone()).is_empty());
    }

    #[test]
    fn test_to_value_roundtrip() {
        let value = json!({"counter": 3, "todos": [{"id": "1"}]});
        assert_eq!(snapshot(value.clone()).to_value(), value);
    }
}
