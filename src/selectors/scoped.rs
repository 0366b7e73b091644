//! Scoped accessor: a one-slot selection paired with a bound setter.

use crate::container::ContainerInner;
use crate::error::{ContainerError, Result};
use crate::types::{ChangeSet, SlotValue};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Weak;

use super::binding::Selection;

/// What a [`SlotSetter`] writes.
pub enum SlotUpdate {
    /// Replace the slot with a literal value.
    Value(Value),
    /// Compute the new value from the previous one.
    With(Box<dyn FnOnce(&Value) -> Value>),
}

impl SlotUpdate {
    pub fn with(f: impl FnOnce(&Value) -> Value + 'static) -> Self {
        SlotUpdate::With(Box::new(f))
    }
}

impl From<Value> for SlotUpdate {
    fn from(value: Value) -> Self {
        SlotUpdate::Value(value)
    }
}

impl fmt::Debug for SlotUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotUpdate::Value(v) => f.debug_tuple("Value").field(v).finish(),
            SlotUpdate::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Writes exactly one slot. Each call is one merge and one change cycle.
#[derive(Clone)]
pub struct SlotSetter {
    key: String,
    container: Weak<ContainerInner>,
}

impl SlotSetter {
    pub(crate) fn new(key: &str, container: Weak<ContainerInner>) -> Self {
        Self {
            key: key.to_string(),
            container,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the slot's value.
    pub fn set(&self, value: impl Into<Value>) -> Result<ChangeSet> {
        let value = value.into();
        self.inner()?.update_slot(&self.key, move |_| value)
    }

    /// Replace the slot with any serializable value.
    pub fn set_serialized(&self, value: &impl Serialize) -> Result<ChangeSet> {
        self.set(serde_json::to_value(value)?)
    }

    /// Replace the slot with a function of its previous value.
    ///
    /// `f` runs while mutations are held off, so the read-modify-write is
    /// atomic with respect to other writers.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) -> Result<ChangeSet> {
        self.inner()?.update_slot(&self.key, f)
    }

    pub fn apply(&self, update: SlotUpdate) -> Result<ChangeSet> {
        match update {
            SlotUpdate::Value(value) => self.set(value),
            SlotUpdate::With(f) => self.update(f),
        }
    }

    fn inner(&self) -> Result<std::sync::Arc<ContainerInner>> {
        self.container
            .upgrade()
            .ok_or(ContainerError::ContainerDropped)
    }
}

impl fmt::Debug for SlotSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotSetter").field("key", &self.key).finish()
    }
}

/// The reactive half of a scoped accessor: a selection of one slot.
#[derive(Debug)]
pub struct ScopedValue {
    key: String,
    selection: Selection,
}

impl ScopedValue {
    pub(crate) fn new(key: &str, selection: Selection) -> Self {
        Self {
            key: key.to_string(),
            selection,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value last delivered for this slot.
    pub fn get(&self) -> Option<SlotValue> {
        self.selection.get(&self.key)
    }

    pub fn is_active(&self) -> bool {
        self.selection.is_active()
    }

    /// Stop receiving updates. The paired setter keeps working.
    pub fn unsubscribe(&self) {
        self.selection.unsubscribe();
    }
}
