//! Core types for the slot container.

use crate::error::{ContainerError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Default bound on nested mutation cycles started from inside listeners.
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 32;

/// An immutable, shareable slot value.
///
/// The wrapped JSON value is never mutated in place. Replacing an
/// object-valued slot with a new `SlotValue` is how a change is signalled.
#[derive(Clone)]
pub struct SlotValue(Arc<Value>);

impl SlotValue {
    pub fn new(value: impl Into<Value>) -> Self {
        SlotValue(Arc::new(value.into()))
    }

    /// Shallow equality used for change detection.
    ///
    /// Primitives (null, bool, number, string) compare by value; arrays and
    /// objects compare by identity. Numbers compare numerically, so `1` and
    /// `1.0` are the same value.
    pub fn same(&self, other: &SlotValue) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            (_, Value::Array(_)) | (_, Value::Object(_)) => false,
            (Value::Number(a), Value::Number(b)) => same_number(a, b),
            (a, b) => a == b,
        }
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Clone out the underlying JSON value.
    pub fn to_value(&self) -> Value {
        (*self.0).clone()
    }

    /// Decode the value into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&*self.0).map_err(|e| ContainerError::Deserialization(e.to_string()))
    }
}

impl Deref for SlotValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl PartialEq for SlotValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<Value> for SlotValue {
    fn eq(&self, other: &Value) -> bool {
        *self.0 == *other
    }
}

impl From<Value> for SlotValue {
    fn from(value: Value) -> Self {
        SlotValue(Arc::new(value))
    }
}

impl fmt::Debug for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotValue({})", self.0)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// A partial view of a snapshot: slot key to value.
pub type SlotMap = BTreeMap<String, SlotValue>;

/// A partial snapshot used as a write payload.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    entries: BTreeMap<String, SlotValue>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot to a JSON value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), SlotValue::new(value));
        self
    }

    /// Set a slot to an existing shared value (keeps its identity).
    pub fn set_shared(mut self, key: impl Into<String>, value: SlotValue) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Set a slot to any serializable value.
    pub fn set_serialized(self, key: impl Into<String>, value: &impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(key, value))
    }

    /// Build a patch from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(ContainerError::InvalidPayload(format!(
                "expected an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a patch from any struct that serializes to a JSON object.
    pub fn from_serialized(value: &impl Serialize) -> Result<Self> {
        Self::from_value(serde_json::to_value(value)?)
    }

    pub fn get(&self, key: &str) -> Option<&SlotValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Value> for Patch {
    type Error = ContainerError;

    fn try_from(value: Value) -> Result<Self> {
        Patch::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Patch {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k, SlotValue::from(v)))
                .collect(),
        }
    }
}

impl FromIterator<(String, SlotValue)> for Patch {
    fn from_iter<I: IntoIterator<Item = (String, SlotValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One slot that changed during a mutation cycle.
#[derive(Clone, Debug)]
pub struct SlotChange {
    pub key: String,
    pub old: SlotValue,
    pub new: SlotValue,
}

/// The slots that changed during one mutation cycle, in key order.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    changes: Vec<SlotChange>,
}

impl ChangeSet {
    pub(crate) fn new(changes: Vec<SlotChange>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&SlotChange> {
        self.changes.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotChange> {
        self.changes.iter()
    }
}

/// Container configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Debug label attached to log events.
    pub name: Option<String>,

    /// Max nested mutation cycles started from inside listeners.
    /// Default: 32
    pub max_notify_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: None,
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

impl ContainerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Integers compare exactly; anything involving a float compares as `f64`.
fn same_number(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    } else {
        a == b
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
