//! Reactive reads over the container.
//!
//! - [`Selection`]: a fixed list of slots, re-delivered when any of them
//!   changes under shallow equality
//! - [`Watch`]: a value derived from the whole snapshot, re-delivered when it
//!   changes under `PartialEq`
//! - [`ScopedValue`] + [`SlotSetter`]: one slot plus a setter bound to it
//!
//! Callbacks run synchronously inside the write that caused them. Scheduling
//! a redraw or any other deferred work is up to the caller.

mod binding;
mod scoped;

pub(crate) use binding::SelectionCallback;
pub use binding::{Selection, Watch};
pub use scoped::{ScopedValue, SlotSetter, SlotUpdate};
