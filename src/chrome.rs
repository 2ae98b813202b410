/// Chrome implementations of the host seams, via the popup.js bridge

use crate::error::PopupError;
use crate::extension_data::ExtensionRecord;
use crate::host::{KeyValueStore, ManagementApi};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getAllExtensions() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setExtensionEnabled(id: &str, enabled: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> Result<(), JsValue>;

    fn getSelfId() -> String;
}

/// Id of the extension hosting this popup (`chrome.runtime.id`)
pub fn self_id() -> String {
    getSelfId()
}

fn js_error_message(e: &JsValue) -> String {
    e.dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| e.as_string())
        .unwrap_or_else(|| format!("{:?}", e))
}

#[derive(Clone, Copy, Default)]
pub struct ChromeManagement;

#[async_trait(?Send)]
impl ManagementApi for ChromeManagement {
    async fn get_all(&self) -> Result<Vec<ExtensionRecord>, PopupError> {
        let items_js = getAllExtensions()
            .await
            .map_err(|e| PopupError::Host(js_error_message(&e)))?;

        serde_wasm_bindgen::from_value(items_js)
            .map_err(|e| PopupError::Host(format!("Failed to parse extensions: {:?}", e)))
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), PopupError> {
        setExtensionEnabled(id, enabled)
            .await
            .map_err(|e| PopupError::HostRejection {
                id: id.to_string(),
                message: js_error_message(&e),
            })
    }
}

#[derive(Clone, Copy, Default)]
pub struct ChromeStorage;

#[async_trait(?Send)]
impl KeyValueStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, PopupError> {
        let value_js = getStorage(key)
            .await
            .map_err(|e| PopupError::Storage(js_error_message(&e)))?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| PopupError::Storage(format!("Failed to parse storage: {:?}", e)))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PopupError> {
        let value_js = value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| PopupError::Storage(format!("Failed to serialize: {:?}", e)))?;

        setStorage(key, value_js)
            .await
            .map_err(|e| PopupError::Storage(js_error_message(&e)))
    }

    async fn remove(&self, key: &str) -> Result<(), PopupError> {
        removeStorage(key)
            .await
            .map_err(|e| PopupError::Storage(js_error_message(&e)))
    }
}
