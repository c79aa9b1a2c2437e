/// Saved-window collection persisted under a single storage key
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::tab_data::{SavedWindow, SavedWindowId};

/// Key the saved windows live under in `chrome.storage.local`
pub const SAVED_WINDOWS_KEY: &str = "savedWindows";

/// Root storage structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedWindowStore {
    pub windows: Vec<SavedWindow>,
}

impl SavedWindowStore {
    pub fn new() -> Self {
        SavedWindowStore { windows: Vec::new() }
    }

    pub fn from_windows(windows: Vec<SavedWindow>) -> Self {
        SavedWindowStore { windows }
    }

    /// Allocate an id from the current time, never reusing or going below an existing one
    pub fn next_id(&self, now_ms: f64) -> SavedWindowId {
        let now = now_ms.max(0.0) as SavedWindowId;
        match self.windows.iter().map(|window| window.id).max() {
            Some(last) if last >= now => last + 1,
            _ => now,
        }
    }

    pub fn add_window(&mut self, window: SavedWindow) {
        self.windows.push(window);
    }

    pub fn remove_window(&mut self, id: SavedWindowId) -> bool {
        let original_len = self.windows.len();
        self.windows.retain(|w| w.id != id);
        self.windows.len() < original_len
    }

    pub fn get_window(&self, id: SavedWindowId) -> Option<&SavedWindow> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn rename_window(&mut self, id: SavedWindowId, new_name: String) -> bool {
        self.windows
            .iter_mut()
            .find(|w| w.id == id)
            .map(|window| {
                window.name = new_name;
            })
            .is_some()
    }

    pub fn into_windows(self) -> Vec<SavedWindow> {
        self.windows
    }
}

/// Name given to a saved window when the user does not pick one
pub fn default_window_name(now_ms: f64) -> String {
    match DateTime::from_timestamp_millis(now_ms as i64) {
        Some(time) => format!("Window {}", time.format("%Y-%m-%d %H:%M:%S")),
        None => "Window".to_string(),
    }
}
