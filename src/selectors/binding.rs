//! Selector bindings: reactive reads that re-deliver on relevant change.

use crate::error::Result;
use crate::state::Snapshot;
use crate::subscriptions::{ChangeNotifier, ListenerId, SnapshotObserver, Subscription};
use crate::types::{ChangeSet, SlotMap, SlotValue};
use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::sync::Arc;

pub(crate) type SelectionCallback = Box<dyn Fn(&SlotMap) + Send + Sync>;

/// Binding over a fixed list of slot keys.
struct KeyBinding {
    keys: Vec<String>,
    /// Values last handed to the consumer.
    delivered: Mutex<SlotMap>,
    on_change: SelectionCallback,
}

impl KeyBinding {
    /// Re-derive from `current`. Returns the new values if any key differs
    /// from what was last delivered.
    fn refresh(&self, current: &Snapshot) -> Option<SlotMap> {
        let mut delivered = self.delivered.lock();

        let stale = self
            .keys
            .iter()
            .any(|key| match (delivered.get(key), current.get(key)) {
                (Some(old), Some(new)) => !old.same(new),
                _ => false,
            });
        if !stale {
            return None;
        }

        let next: SlotMap = self
            .keys
            .iter()
            .filter_map(|key| current.get(key).map(|v| (key.clone(), v.clone())))
            .collect();
        *delivered = next.clone();
        Some(next)
    }
}

impl SnapshotObserver for KeyBinding {
    fn on_change(&self, changes: &ChangeSet, current: &Snapshot) {
        if !self.keys.iter().any(|key| changes.contains(key)) {
            return;
        }
        // Lock is released before the callback so it may read the selection.
        if let Some(values) = self.refresh(current) {
            (self.on_change)(&values);
        }
    }
}

/// A live read of a fixed set of slots.
///
/// The callback passed at creation runs synchronously whenever any selected
/// slot changes under shallow equality. Creating a selection does not fire
/// it.
pub struct Selection {
    binding: Arc<KeyBinding>,
    subscription: Subscription,
}

impl Selection {
    pub(crate) fn bind(
        notifier: &Arc<ChangeNotifier>,
        current: &Snapshot,
        keys: &[&str],
        on_change: SelectionCallback,
    ) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.iter().any(|k| k == *key) {
                unique.push(key.to_string());
            }
        }
        let delivered = current.pick(unique.iter().map(String::as_str))?;

        let binding = Arc::new(KeyBinding {
            keys: unique,
            delivered: Mutex::new(delivered),
            on_change,
        });
        let subscription =
            notifier.register_observer(Arc::clone(&binding) as Arc<dyn SnapshotObserver>);

        Ok(Self {
            binding,
            subscription,
        })
    }

    /// The selected keys, in selection order.
    pub fn keys(&self) -> &[String] {
        &self.binding.keys
    }

    /// Values last delivered to the consumer.
    pub fn values(&self) -> SlotMap {
        self.binding.delivered.lock().clone()
    }

    pub fn get(&self, key: &str) -> Option<SlotValue> {
        self.binding.delivered.lock().get(key).cloned()
    }

    pub fn id(&self) -> ListenerId {
        self.subscription.id()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop receiving updates. Idempotent.
    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("keys", &self.binding.keys)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Binding over a value derived from the whole snapshot.
struct DerivedBinding<T> {
    select: Box<dyn Fn(&Snapshot) -> T + Send + Sync>,
    last: Mutex<T>,
    on_change: Box<dyn Fn(&T, &T) + Send + Sync>,
}

impl<T> SnapshotObserver for DerivedBinding<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn on_change(&self, _changes: &ChangeSet, current: &Snapshot) {
        let next = (self.select)(current);
        let prev = {
            let mut last = self.last.lock();
            if *last == next {
                return;
            }
            mem::replace(&mut *last, next.clone())
        };
        (self.on_change)(&next, &prev);
    }
}

/// A live derived value.
///
/// The selector runs after every change cycle; the callback receives
/// `(new, old)` only when the derived value differs under `PartialEq`.
pub struct Watch<T> {
    binding: Arc<DerivedBinding<T>>,
    subscription: Subscription,
}

impl<T> Watch<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub(crate) fn bind(
        notifier: &Arc<ChangeNotifier>,
        current: &Snapshot,
        select: Box<dyn Fn(&Snapshot) -> T + Send + Sync>,
        on_change: Box<dyn Fn(&T, &T) + Send + Sync>,
    ) -> Self {
        let initial = select(current);
        let binding = Arc::new(DerivedBinding {
            select,
            last: Mutex::new(initial),
            on_change,
        });
        let subscription =
            notifier.register_observer(Arc::clone(&binding) as Arc<dyn SnapshotObserver>);

        Self {
            binding,
            subscription,
        }
    }

    /// Value last delivered to the consumer.
    pub fn current(&self) -> T {
        self.binding.last.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop receiving updates. Idempotent.
    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}

impl<T: fmt::Debug> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("current", &*self.binding.last.lock())
            .field("active", &self.subscription.is_active())
            .finish()
    }
}
