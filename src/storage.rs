/// Batch persistence in chrome.storage.local

use crate::error::PopupError;
use crate::host::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Storage key holding the last suspended batch
pub const BATCH_STORAGE_KEY: &str = "lastSuspendedBatch";

/// Extensions this popup disabled as a group and has not yet restored
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Batch(BTreeSet<String>);

impl Batch {
    pub fn new() -> Self {
        Batch(BTreeSet::new())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn is_subset(&self, other: &Batch) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl<S: Into<String>> FromIterator<S> for Batch {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Batch(iter.into_iter().map(Into::into).collect())
    }
}

/// Reads and writes the batch under a single key
pub struct BatchStore<S> {
    store: S,
}

impl<S: KeyValueStore> BatchStore<S> {
    pub fn new(store: S) -> Self {
        BatchStore { store }
    }

    /// Load the persisted batch. A missing or malformed value is an empty batch.
    pub async fn load(&self) -> Result<Batch, PopupError> {
        let Some(value) = self.store.get(BATCH_STORAGE_KEY).await? else {
            return Ok(Batch::new());
        };

        match serde_json::from_value::<Batch>(value) {
            Ok(batch) => Ok(batch),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", BATCH_STORAGE_KEY, e);
                Ok(Batch::new())
            }
        }
    }

    /// Persist the batch, deleting the key when it is empty
    pub async fn save(&self, batch: &Batch) -> Result<(), PopupError> {
        if batch.is_empty() {
            self.store.remove(BATCH_STORAGE_KEY).await
        } else {
            let value = serde_json::to_value(batch)?;
            self.store.set(BATCH_STORAGE_KEY, value).await
        }
    }
}
