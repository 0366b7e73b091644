//! The snapshot store: sole owner of the live and baseline snapshots.

use crate::error::Result;
use crate::state::operations::apply_patch;
use crate::state::Snapshot;
use crate::types::Patch;
use parking_lot::RwLock;
use std::mem;

/// Holds the live snapshot and the reset baseline.
///
/// The two are kept as separate maps. Slot values may be shared between them
/// because values are immutable; the maps themselves are replaced, never
/// edited, so writing the live snapshot cannot reach the baseline.
pub struct SnapshotStore {
    current: RwLock<Snapshot>,
    initial: RwLock<Snapshot>,
}

/// The snapshots on either side of a single write.
pub(crate) struct Transition {
    pub old: Snapshot,
    pub new: Snapshot,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(initial.clone()),
            initial: RwLock::new(initial),
        }
    }

    /// Current snapshot. O(1).
    pub fn read(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Current reset baseline.
    pub fn initial(&self) -> Snapshot {
        self.initial.read().clone()
    }

    /// Overwrite `patch`'s keys in the live snapshot.
    pub(crate) fn merge(&self, patch: &Patch) -> Result<Transition> {
        let mut current = self.current.write();
        let next = apply_patch(&current, patch)?;
        let old = mem::replace(&mut *current, next.clone());
        Ok(Transition { old, new: next })
    }

    /// Set the live snapshot to the baseline overlaid with `patch`.
    pub(crate) fn replace(&self, patch: &Patch) -> Result<Transition> {
        let next = apply_patch(&self.initial(), patch)?;
        let old = mem::replace(&mut *self.current.write(), next.clone());
        Ok(Transition { old, new: next })
    }

    /// Merge `patch` into both the live snapshot and the baseline.
    pub(crate) fn merge_with_baseline(&self, patch: &Patch) -> Result<Transition> {
        let mut current = self.current.write();
        let mut initial = self.initial.write();

        let next = apply_patch(&current, patch)?;
        *initial = apply_patch(&initial, patch)?;
        let old = mem::replace(&mut *current, next.clone());
        Ok(Transition { old, new: next })
    }
}
