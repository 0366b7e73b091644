//! # Slot Container
//!
//! An in-process reactive state container: one object of named slots with
//! selective change notification.
//!
//! ## Core Concepts
//!
//! - **Slots**: Named fields fixed by the initial state
//! - **Snapshots**: Immutable point-in-time views, replaced on every write
//! - **Selections**: Reactive reads that fire only when their slots change
//! - **Scoped accessors**: One slot's reactive read plus a bound setter
//! - **Hydration**: Merging bootstrap data into both state and reset baseline
//! - **Reset**: Restoring slots to the baseline
//!
//! Every operation is synchronous. A write, including all listener and
//! binding callbacks it triggers, completes before the call returns.
//!
//! ## Example
//!
//! ```ignore
//! use slotbox::{Container, Patch};
//! use serde_json::json;
//!
//! let container = Container::new(json!({"counter": 0, "theme": "light"}))?;
//!
//! // React to one slot
//! let selection = container.select(&["counter"], |values| {
//!     println!("counter is now {}", values["counter"]);
//! })?;
//!
//! // Write
//! container.merge(Patch::new().set("counter", 1))?;
//!
//! // Scoped accessor
//! let (theme, set_theme) = container.scope("theme", |_| {})?;
//! set_theme.update(|prev| if prev == "light" { "dark".into() } else { "light".into() })?;
//!
//! // Back to the baseline
//! container.reset_all()?;
//! selection.unsubscribe();
//! theme.unsubscribe();
//! ```

pub mod container;
pub mod error;
pub mod hydration;
pub mod selectors;
pub mod state;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use container::Container;
pub use error::{ContainerError, Result};
pub use hydration::HydrationGate;
pub use selectors::{ScopedValue, Selection, SlotSetter, SlotUpdate, Watch};
pub use state::{Snapshot, SnapshotStore};
pub use subscriptions::{ChangeNotifier, KeyListener, ListenerId, Subscription};
pub use types::*;
