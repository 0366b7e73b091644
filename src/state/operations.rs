//! Patch application.

use crate::error::{ContainerError, Result};
use crate::state::Snapshot;
use crate::types::Patch;

/// Check that every key in `patch` is declared in `schema`.
pub fn validate_patch(schema: &Snapshot, patch: &Patch) -> Result<()> {
    match patch.keys().find(|key| !schema.contains_key(key)) {
        Some(key) => Err(ContainerError::InvalidPayload(format!(
            "undeclared slot: {}",
            key
        ))),
        None => Ok(()),
    }
}

/// Apply a patch on top of a snapshot, producing a new snapshot.
///
/// Keys absent from the patch keep their values (and identities) from `base`.
pub fn apply_patch(base: &Snapshot, patch: &Patch) -> Result<Snapshot> {
    validate_patch(base, patch)?;

    let mut slots = base.slots().clone();
    for (key, value) in patch.iter() {
        slots.insert(key.to_string(), value.clone());
    }

    Ok(Snapshot::from_slots(slots))
}

/// Build a patch that restores `keys` to their values in `source`.
pub fn restore_patch<'a>(source: &Snapshot, keys: impl IntoIterator<Item = &'a str>) -> Result<Patch> {
    Ok(source.pick(keys)?.into_iter().collect())
}
