//! Subscription types for slot change notification.

use crate::state::Snapshot;
use crate::types::{ChangeSet, SlotValue};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::manager::ChangeNotifier;

/// Unique identifier for a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Callback for a single slot, receives `(new, old)`.
pub type KeyListener = Arc<dyn Fn(&SlotValue, &SlotValue) + Send + Sync>;

/// Receives every non-empty change set together with the live snapshot.
pub(crate) trait SnapshotObserver: Send + Sync {
    fn on_change(&self, changes: &ChangeSet, current: &Snapshot);
}

/// Handle to a registration.
///
/// Its only capability is removing that registration. Dropping the handle
/// does not unsubscribe.
pub struct Subscription {
    id: ListenerId,
    notifier: Weak<ChangeNotifier>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, notifier: &Arc<ChangeNotifier>) -> Self {
        Self {
            id,
            notifier: Arc::downgrade(notifier),
            active: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether this handle has not been used to unsubscribe yet.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Remove the registration. Calling this more than once is a no-op.
    ///
    /// Called from inside a callback, the registration is not invoked again,
    /// even later in the same pass.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
