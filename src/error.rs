/// Error types for popup operations

/// Errors raised while talking to the browser or acting on extensions
#[derive(Debug, thiserror::Error)]
pub enum PopupError {
    #[error("Host call failed: {0}")]
    Host(String),

    #[error("Could not change {id}: {message}")]
    HostRejection { id: String, message: String },

    #[error("Cannot disable this extension")]
    SelfProtection,

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PopupError {
    /// Short text for the transient notice
    pub fn notice(&self) -> String {
        match self {
            PopupError::SelfProtection => self.to_string(),
            PopupError::HostRejection { message, .. } => format!("Error: {}", message),
            other => format!("Error: {}", other),
        }
    }
}
