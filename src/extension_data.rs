/// Data structures for Extension Switch
use serde::{Deserialize, Serialize};

/// Kind of installed item, as reported by `chrome.management`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionType {
    Extension,
    PackagedApp,
    HostedApp,
    LegacyPackagedApp,
    Theme,
    LoginScreenExtension,
    #[serde(other)]
    Other,
}

/// One icon of an installed item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IconInfo {
    pub size: u32,
    pub url: String,
}

/// Snapshot of one installed item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    pub may_disable: bool,
    #[serde(rename = "type")]
    pub kind: ExtensionType,
    #[serde(default)]
    pub icons: Vec<IconInfo>,
}

impl ExtensionRecord {
    pub fn new(id: &str, name: &str, enabled: bool, may_disable: bool) -> ExtensionRecord {
        ExtensionRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            enabled,
            may_disable,
            kind: ExtensionType::Extension,
            icons: Vec::new(),
        }
    }

    /// Description text for display, treating a blank description as absent
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Outcome of one toggle attempt inside a bulk action
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub id: String,
    pub error: Option<String>,
}

impl OperationResult {
    pub fn succeeded(id: &str) -> OperationResult {
        OperationResult {
            id: id.to_string(),
            error: None,
        }
    }

    pub fn failed(id: &str, error: String) -> OperationResult {
        OperationResult {
            id: id.to_string(),
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}
