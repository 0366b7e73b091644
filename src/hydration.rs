//! Once-per-lifecycle hydration.

use crate::container::Container;
use crate::error::Result;
use crate::types::{ChangeSet, Patch};
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs [`Container::hydrate`] at most once per owner.
///
/// A consumer creates one gate when it mounts and routes its bootstrap data
/// through it. The first successful call hydrates; later calls are skipped.
#[derive(Debug, Default)]
pub struct HydrationGate {
    done: AtomicBool,
}

impl HydrationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Hydrate on the first call. Returns `Ok(None)` if already done.
    ///
    /// A failed hydration changes nothing, so the gate stays open.
    pub fn hydrate(&self, container: &Container, patch: Patch) -> Result<Option<ChangeSet>> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        match container.hydrate(patch) {
            Ok(changes) => Ok(Some(changes)),
            Err(e) => {
                self.done.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}
