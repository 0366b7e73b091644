//! Change notifier: owns the listener registry and fans out change sets.

use crate::state::Snapshot;
use crate::types::ChangeSet;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{KeyListener, ListenerId, SnapshotObserver, Subscription};

/// One registration.
#[derive(Clone)]
enum Entry {
    /// Manual listener on a single slot.
    Key { key: String, listener: KeyListener },
    /// Selector binding.
    Observer(Arc<dyn SnapshotObserver>),
}

/// A registration plus its liveness flag, shared with in-flight passes.
#[derive(Clone)]
struct Registration {
    id: ListenerId,
    entry: Entry,
    live: Arc<AtomicBool>,
}

/// Manages registrations and dispatches change sets to them.
pub struct ChangeNotifier {
    /// Registrations in registration order.
    entries: RwLock<Vec<Registration>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener on one slot.
    pub(crate) fn register_key(self: &Arc<Self>, key: &str, listener: KeyListener) -> Subscription {
        self.register(Entry::Key {
            key: key.to_string(),
            listener,
        })
    }

    /// Register a selector binding.
    pub(crate) fn register_observer(self: &Arc<Self>, observer: Arc<dyn SnapshotObserver>) -> Subscription {
        self.register(Entry::Observer(observer))
    }

    fn register(self: &Arc<Self>, entry: Entry) -> Subscription {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.write().push(Registration {
            id,
            entry,
            live: Arc::new(AtomicBool::new(true)),
        });
        Subscription::new(id, self)
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|reg| reg.id == id) {
            Some(pos) => {
                let reg = entries.remove(pos);
                reg.live.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Get registration count.
    pub fn listener_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Dispatch a change set.
    ///
    /// The registry is copied before the pass. Registrations added by a
    /// callback are first invoked on the next cycle; registrations removed by
    /// a callback are skipped if the pass has not reached them yet. `current`
    /// yields the live snapshot for selector bindings.
    pub(crate) fn notify(&self, changes: &ChangeSet, current: &dyn Fn() -> Snapshot) {
        if changes.is_empty() {
            return;
        }

        let entries: Vec<Registration> = self.entries.read().clone();

        tracing::trace!(
            changed = changes.len(),
            registrations = entries.len(),
            "dispatching change set"
        );

        for reg in entries {
            if !reg.live.load(Ordering::SeqCst) {
                continue;
            }
            match reg.entry {
                Entry::Key { key, listener } => {
                    if let Some(change) = changes.get(&key) {
                        listener(&change.new, &change.old);
                    }
                }
                Entry::Observer(observer) => observer.on_change(changes, &current()),
            }
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
