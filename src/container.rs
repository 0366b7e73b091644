//! Main Container struct tying all components together.

use crate::error::{ContainerError, Result};
use crate::selectors::{ScopedValue, Selection, SelectionCallback, SlotSetter, Watch};
use crate::state::{restore_patch, Snapshot, SnapshotStore, Transition};
use crate::subscriptions::{ChangeNotifier, Subscription};
use crate::types::{ChangeSet, ContainerConfig, Patch, SlotMap, SlotValue};
use parking_lot::ReentrantMutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

/// Shared interior of a [`Container`].
pub(crate) struct ContainerInner {
    config: ContainerConfig,

    /// Live and baseline snapshots.
    store: SnapshotStore,

    /// Listener registry.
    notifier: Arc<ChangeNotifier>,

    /// Serializes change cycles. Re-entrant so listeners may write; the cell
    /// counts how deeply cycles are nested on the owning thread.
    write_lock: ReentrantMutex<Cell<usize>>,
}

/// Restores the nesting counter when a cycle ends, including on unwind.
struct Nesting<'a>(&'a Cell<usize>);

impl Drop for Nesting<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl ContainerInner {
    fn label(&self) -> &str {
        self.config.name.as_deref().unwrap_or("anonymous")
    }

    /// The single mutation funnel.
    ///
    /// Runs `write` against the store, diffs the two sides and dispatches
    /// the change set before returning. Every write path ends up here.
    pub(crate) fn commit<F>(&self, op: &'static str, write: F) -> Result<ChangeSet>
    where
        F: FnOnce(&SnapshotStore) -> Result<Transition>,
    {
        let depth = self.write_lock.lock();
        let level = depth.get();
        if level >= self.config.max_notify_depth {
            tracing::warn!(
                container = self.label(),
                op,
                limit = self.config.max_notify_depth,
                "nested notification depth exceeded"
            );
            return Err(ContainerError::NotifyDepthExceeded {
                limit: self.config.max_notify_depth,
            });
        }
        depth.set(level + 1);
        let _nesting = Nesting(&depth);

        let Transition { old, new } = write(&self.store)?;
        let changes = old.diff(&new);

        tracing::trace!(
            container = self.label(),
            op,
            depth = level,
            changed = changes.len(),
            "committed"
        );

        self.notifier.notify(&changes, &|| self.store.read());
        Ok(changes)
    }

    /// Read-modify-write of one slot.
    pub(crate) fn update_slot<F>(&self, key: &str, f: F) -> Result<ChangeSet>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.commit("set", |store| {
            let prev = store.read().require(key)?.clone();
            let next = f(&prev);
            store.merge(&Patch::new().set(key, next))
        })
    }
}

/// A reactive container of named slots.
///
/// The slot set is fixed by the initial state. Cloning a `Container` yields
/// another handle to the same state; pass it to whatever needs it.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a container from a JSON object. Each field becomes a slot.
    pub fn new(initial: Value) -> Result<Self> {
        Self::with_config(initial, ContainerConfig::default())
    }

    /// Create a container with explicit configuration.
    pub fn with_config(initial: Value, config: ContainerConfig) -> Result<Self> {
        let initial = Snapshot::from_value(initial)?;

        tracing::debug!(
            container = config.name.as_deref().unwrap_or("anonymous"),
            slots = initial.len(),
            "container created"
        );

        Ok(Self {
            inner: Arc::new(ContainerInner {
                config,
                store: SnapshotStore::new(initial),
                notifier: Arc::new(ChangeNotifier::new()),
                write_lock: ReentrantMutex::new(Cell::new(0)),
            }),
        })
    }

    /// Create a container from any struct that serializes to an object.
    pub fn from_state<T: Serialize>(initial: &T) -> Result<Self> {
        Self::from_state_with_config(initial, ContainerConfig::default())
    }

    pub fn from_state_with_config<T: Serialize>(initial: &T, config: ContainerConfig) -> Result<Self> {
        Self::with_config(serde_json::to_value(initial)?, config)
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.config.name.as_deref()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    // --- Reads ---

    /// The live snapshot. No subscription is created.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.store.read()
    }

    /// The current reset baseline.
    pub fn initial_snapshot(&self) -> Snapshot {
        self.inner.store.initial()
    }

    pub fn get(&self, key: &str) -> Result<SlotValue> {
        Ok(self.snapshot().require(key)?.clone())
    }

    /// Read a slot and decode it.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)?.deserialize()
    }

    /// Read several slots from the same snapshot.
    pub fn get_many(&self, keys: &[&str]) -> Result<SlotMap> {
        self.snapshot().pick(keys.iter().copied())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.snapshot().contains_key(key)
    }

    /// Declared slot keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.snapshot().keys().map(str::to_string).collect()
    }

    // --- Writes ---

    /// Overwrite the patched slots; others keep their values.
    pub fn merge(&self, patch: Patch) -> Result<ChangeSet> {
        self.inner.commit("merge", |store| store.merge(&patch))
    }

    /// Set the state to the baseline overlaid with `patch`.
    ///
    /// Slots missing from `patch` fall back to their baseline values.
    pub fn replace(&self, patch: Patch) -> Result<ChangeSet> {
        self.inner.commit("replace", |store| store.replace(&patch))
    }

    // --- Reset ---

    /// Restore one slot to its baseline value.
    pub fn reset(&self, key: &str) -> Result<ChangeSet> {
        self.reset_many(&[key])
    }

    /// Restore several slots to their baseline values in one cycle.
    pub fn reset_many(&self, keys: &[&str]) -> Result<ChangeSet> {
        tracing::debug!(container = self.inner.label(), keys = ?keys, "resetting slots");

        self.inner.commit("reset", |store| {
            let patch = restore_patch(&store.initial(), keys.iter().copied())?;
            store.merge(&patch)
        })
    }

    /// Restore every slot to its baseline value.
    pub fn reset_all(&self) -> Result<ChangeSet> {
        tracing::debug!(container = self.inner.label(), "resetting all slots");

        self.inner
            .commit("reset_all", |store| store.replace(&Patch::new()))
    }

    // --- Hydration ---

    /// Merge externally supplied values into the state and the baseline.
    ///
    /// Later resets restore hydrated values. An empty patch does nothing.
    /// Repeat calls each perform a real merge; see
    /// [`HydrationGate`](crate::HydrationGate) for run-once semantics.
    pub fn hydrate(&self, patch: Patch) -> Result<ChangeSet> {
        if patch.is_empty() {
            return Ok(ChangeSet::default());
        }

        tracing::debug!(
            container = self.inner.label(),
            slots = patch.len(),
            "hydrating"
        );

        self.inner
            .commit("hydrate", |store| store.merge_with_baseline(&patch))
    }

    // --- Subscriptions ---

    /// Listen to one slot. The listener receives `(new, old)`.
    ///
    /// The registration lives until [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, key: &str, listener: F) -> Result<Subscription>
    where
        F: Fn(&SlotValue, &SlotValue) + Send + Sync + 'static,
    {
        self.snapshot().require(key)?;
        Ok(self.inner.notifier.register_key(key, Arc::new(listener)))
    }

    /// Bind to a fixed list of slots.
    ///
    /// `on_change` runs whenever any of them changes; suppressed when every
    /// selected value is shallow-equal to the one last delivered.
    pub fn select<F>(&self, keys: &[&str], on_change: F) -> Result<Selection>
    where
        F: Fn(&SlotMap) + Send + Sync + 'static,
    {
        self.bind_selection(keys, Box::new(on_change))
    }

    /// Bind to a value derived from the whole snapshot.
    pub fn watch<T, S, F>(&self, selector: S, on_change: F) -> Watch<T>
    where
        T: Clone + PartialEq + Send + 'static,
        S: Fn(&Snapshot) -> T + Send + Sync + 'static,
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let _cycle = self.inner.write_lock.lock();
        Watch::bind(
            &self.inner.notifier,
            &self.inner.store.read(),
            Box::new(selector),
            Box::new(on_change),
        )
    }

    /// A live read of one slot paired with a setter for it.
    pub fn scope<F>(&self, key: &str, on_change: F) -> Result<(ScopedValue, SlotSetter)>
    where
        F: Fn(&SlotValue) + Send + Sync + 'static,
    {
        let owned = key.to_string();
        let selection = self.bind_selection(
            &[key],
            Box::new(move |values: &SlotMap| {
                if let Some(value) = values.get(&owned) {
                    on_change(value);
                }
            }),
        )?;

        Ok((ScopedValue::new(key, selection), self.setter(key)?))
    }

    /// A setter for one slot, without a reactive read.
    pub fn setter(&self, key: &str) -> Result<SlotSetter> {
        self.snapshot().require(key)?;
        Ok(SlotSetter::new(key, Arc::downgrade(&self.inner)))
    }

    /// Number of live registrations (listeners and bindings).
    pub fn listener_count(&self) -> usize {
        self.inner.notifier.listener_count()
    }

    fn bind_selection(&self, keys: &[&str], on_change: SelectionCallback) -> Result<Selection> {
        // Hold off writers so the first delivery and the registration agree.
        let _cycle = self.inner.write_lock.lock();
        Selection::bind(
            &self.inner.notifier,
            &self.inner.store.read(),
            keys,
            on_change,
        )
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.config.name)
            .field("snapshot", &self.inner.store.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn container() -> Container {
        Container::new(json!({"counter": 0, "theme": "light"})).unwrap()
    }

    #[test]
    fn test_merge_and_notify() {
        let c = container();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_ref = Arc::clone(&log);
        c.subscribe("counter", move |new, old| {
            log_ref.lock().push((old.to_value(), new.to_value()))
        })
        .unwrap();

        let changes = c.merge(Patch::new().set("counter", 1)).unwrap();
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["counter"]);
        assert_eq!(c.get("counter").unwrap(), json!(1));
        assert_eq!(c.get("theme").unwrap(), json!("light"));
        assert_eq!(*log.lock(), vec![(json!(0), json!(1))]);

        c.reset_all().unwrap();
        assert_eq!(c.get("counter").unwrap(), json!(0));
    }

    #[test]
    fn test_nested_write_from_listener() {
        let c = container();
        let writer = c.clone();
        c.subscribe("counter", move |new, _| {
            if new.as_i64() == Some(1) {
                writer.merge(Patch::new().set("theme", "dark")).unwrap();
            }
        })
        .unwrap();

        c.merge(Patch::new().set("counter", 1)).unwrap();
        assert_eq!(c.get("theme").unwrap(), json!("dark"));
    }

    #[test]
    fn test_nesting_bound() {
        let c = Container::with_config(
            json!({"counter": 0}),
            ContainerConfig {
                name: Some("bounded".into()),
                max_notify_depth: 3,
            },
        )
        .unwrap();

        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_ref = Arc::clone(&errors);
        let writer = c.clone();
        c.subscribe("counter", move |new, _| {
            let next = new.as_i64().unwrap_or(0) + 1;
            if let Err(e) = writer.merge(Patch::new().set("counter", next)) {
                errors_ref.lock().push(e.to_string());
            }
        })
        .unwrap();

        c.merge(Patch::new().set("counter", 1)).unwrap();

        // Three cycles succeed (1, 2, 3); the fourth is refused.
        assert_eq!(c.get("counter").unwrap(), json!(3));
        assert_eq!(errors.lock().len(), 1);

        // The counter unwound; top-level writes work again.
        c.merge(Patch::new().set("counter", 10)).unwrap();
    }

    #[test]
    fn test_setter_outliving_container() {
        let c = container();
        let setter = c.setter("counter").unwrap();
        drop(c);

        assert!(matches!(
            setter.set(5),
            Err(ContainerError::ContainerDropped)
        ));
    }

    #[test]
    fn test_from_state() {
        #[derive(Serialize)]
        struct AppState {
            counter: u32,
            theme: String,
        }

        let c = Container::from_state(&AppState {
            counter: 7,
            theme: "dark".into(),
        })
        .unwrap();
        assert_eq!(c.keys(), vec!["counter", "theme"]);
        assert_eq!(c.get_as::<u32>("counter").unwrap(), 7);
    }
}
