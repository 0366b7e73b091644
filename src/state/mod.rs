//! Snapshot storage.
//!
//! The live snapshot and the reset baseline live in a [`SnapshotStore`].
//! Every write goes through [`operations::apply_patch`], which builds a new
//! snapshot instead of editing the current one.

mod operations;
mod snapshot;
mod store;

pub use operations::{apply_patch, restore_patch, validate_patch};
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
pub(crate) use store::Transition;
