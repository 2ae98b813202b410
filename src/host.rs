/// Host platform seams: extension management and key-value storage

use crate::extension_data::ExtensionRecord;
use crate::error::PopupError;
use async_trait::async_trait;
use serde_json::Value;

/// `chrome.management` as seen by the popup
#[async_trait(?Send)]
pub trait ManagementApi {
    /// Every installed item, unfiltered and unsorted
    async fn get_all(&self) -> Result<Vec<ExtensionRecord>, PopupError>;

    /// Enable or disable one item. A rejected request is `PopupError::HostRejection`.
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), PopupError>;
}

/// `chrome.storage.local` style persistence
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, PopupError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), PopupError>;

    async fn remove(&self, key: &str) -> Result<(), PopupError>;
}
