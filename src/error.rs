/// Errors raised by the orchestration layer around the browser and storage
use thiserror::Error;

use crate::tab_data::{SavedWindowId, WindowId};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Browser call `{call}` failed: {message}")]
    Browser { call: &'static str, message: String },

    #[error("Storage call failed: {0}")]
    Storage(String),

    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Saved window not found: {0}")]
    SavedWindowNotFound(SavedWindowId),

    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),
}

impl BridgeError {
    pub fn browser(call: &'static str, message: impl Into<String>) -> Self {
        BridgeError::Browser {
            call,
            message: message.into(),
        }
    }

    pub fn decode(what: &'static str, message: impl Into<String>) -> Self {
        BridgeError::Decode {
            what,
            message: message.into(),
        }
    }
}
