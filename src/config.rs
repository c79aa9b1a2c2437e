/// Runtime settings for the tab manager
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::grouping::DEFAULT_MIN_GROUP_SIZE;
use crate::operations::SortKey;
use crate::storage::SAVED_WINDOWS_KEY;

/// `chrome.storage.local` key holding the settings object
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Domains with fewer tabs fold into the "other" group
    pub min_group_size: usize,
    /// Key used by the sort commands until changed
    pub sort_key: SortKey,
    pub storage_key: String,
    /// Drop repeated URLs when saving a window
    pub dedupe_saved_tabs: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            sort_key: SortKey::Url,
            storage_key: SAVED_WINDOWS_KEY.to_string(),
            dedupe_saved_tabs: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse settings JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Config, BridgeError> {
        serde_json::from_str(json).map_err(|e| BridgeError::decode("config", e.to_string()))
    }

    /// Resolve settings read from storage; missing or unreadable settings use the defaults
    pub fn from_stored(stored: Result<Option<String>, BridgeError>) -> Config {
        match stored.and_then(|json| json.map(|json| Config::from_json(&json)).transpose()) {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Config::default()
            }
        }
    }

    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}
