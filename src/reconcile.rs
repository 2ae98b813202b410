/// Batch reconciliation against the live directory

use crate::directory;
use crate::error::PopupError;
use crate::extension_data::ExtensionRecord;
use crate::host::KeyValueStore;
use crate::storage::{Batch, BatchStore};

/// Keep only batch members that still exist and are still disabled
pub fn reconcile(batch: &Batch, records: &[ExtensionRecord]) -> Batch {
    batch
        .iter()
        .filter(|id| directory::find(records, id).map_or(false, |r| !r.enabled))
        .collect()
}

/// Reconcile in place and write the result through to the store when it changed
///
/// The in-memory batch is updated even when the write fails.
pub async fn reconcile_and_store<S: KeyValueStore>(
    store: &BatchStore<S>,
    batch: &mut Batch,
    records: &[ExtensionRecord],
) -> Result<(), PopupError> {
    let reconciled = reconcile(batch, records);
    if reconciled == *batch {
        return Ok(());
    }

    log::debug!(
        "Dropping {} stale batch entries",
        batch.len() - reconciled.len()
    );
    *batch = reconciled;
    store.save(batch).await
}
