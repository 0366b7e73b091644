//! Change notification for slot updates.
//!
//! The [`ChangeNotifier`] keeps every registration in registration order:
//! - Manual key listeners, called with `(new, old)` when their slot changes
//! - Selector bindings, which re-derive from the live snapshot
//!
//! Dispatch is synchronous and runs on the thread that performed the write.
//!
//! # Example
//!
//! ```ignore
//! let sub = container.subscribe("counter", |new, old| {
//!     println!("counter: {} -> {}", old, new);
//! })?;
//!
//! container.merge(Patch::new().set("counter", 1))?;
//!
//! // Registrations are released explicitly
//! sub.unsubscribe();
//! ```

mod manager;
mod types;

pub use manager::ChangeNotifier;
pub(crate) use types::SnapshotObserver;
pub use types::{KeyListener, ListenerId, Subscription};
