/// Chrome-backed implementations of the browser and storage seams
use async_trait::async_trait;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::commands::{BrowserApi, SessionStore};
use crate::config::{Config, SETTINGS_KEY};
use crate::error::BridgeError;
use crate::tab_data::{RawWindow, SavedTab, SavedWindow, TabId, WindowId};

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getAllWindows() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn moveTab(tab_id: i32, window_id: i32, index: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn focusTab(tab_id: i32, window_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openWindow(tabs: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openOrFocusPage(path: &str) -> Result<(), JsValue>;

    fn watchTabChanges(listener: &Closure<dyn FnMut()>) -> js_sys::Function;

    #[wasm_bindgen(catch)]
    async fn getSettings(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// `chrome.tabs` / `chrome.windows`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeBrowser;

#[async_trait(?Send)]
impl BrowserApi for ChromeBrowser {
    async fn list_windows(&self) -> Result<Vec<RawWindow>, BridgeError> {
        let windows_js = getAllWindows()
            .await
            .map_err(|e| BridgeError::browser("windows.getAll", js_message(&e)))?;
        serde_wasm_bindgen::from_value(windows_js).map_err(|e| BridgeError::decode("windows", e.to_string()))
    }

    async fn move_tab(&self, tab_id: TabId, window_id: WindowId, index: i32) -> Result<(), BridgeError> {
        moveTab(tab_id, window_id, index)
            .await
            .map_err(|e| BridgeError::browser("tabs.move", js_message(&e)))
    }

    async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), BridgeError> {
        let tab_ids_js =
            serde_wasm_bindgen::to_value(tab_ids).map_err(|e| BridgeError::decode("tab ids", e.to_string()))?;
        removeTabs(tab_ids_js)
            .await
            .map_err(|e| BridgeError::browser("tabs.remove", js_message(&e)))
    }

    async fn focus_tab(&self, tab_id: TabId, window_id: WindowId) -> Result<(), BridgeError> {
        focusTab(tab_id, window_id)
            .await
            .map_err(|e| BridgeError::browser("tabs.update", js_message(&e)))
    }

    async fn open_window(&self, tabs: &[SavedTab]) -> Result<(), BridgeError> {
        let tabs_js = serde_wasm_bindgen::to_value(tabs).map_err(|e| BridgeError::decode("tabs", e.to_string()))?;
        openWindow(tabs_js)
            .await
            .map_err(|e| BridgeError::browser("windows.create", js_message(&e)))
    }

    async fn open_or_focus_page(&self, path: &str) -> Result<(), BridgeError> {
        openOrFocusPage(path)
            .await
            .map_err(|e| BridgeError::browser("tabs.query", js_message(&e)))
    }
}

/// Settings stored under [`SETTINGS_KEY`], or the defaults
pub async fn load_config() -> Config {
    let stored = getSettings(SETTINGS_KEY)
        .await
        .map(|settings_js| settings_js.as_string())
        .map_err(|e| BridgeError::Storage(format!("Failed to get {SETTINGS_KEY}: {}", js_message(&e))));
    Config::from_stored(stored)
}

/// Subscription to tab and window changes; dropping it unsubscribes
pub struct TabWatch {
    unsubscribe: js_sys::Function,
    _listener: Closure<dyn FnMut()>,
}

impl TabWatch {
    pub fn new(on_change: impl FnMut() + 'static) -> TabWatch {
        let listener = Closure::<dyn FnMut()>::new(on_change);
        let unsubscribe = watchTabChanges(&listener);
        TabWatch {
            unsubscribe,
            _listener: listener,
        }
    }
}

impl Drop for TabWatch {
    fn drop(&mut self) {
        if let Err(e) = self.unsubscribe.call0(&JsValue::NULL) {
            log::warn!("Failed to stop watching tabs: {}", js_message(&e));
        }
    }
}

/// `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

#[async_trait(?Send)]
impl SessionStore for ChromeStorage {
    async fn load(&self, key: &str) -> Result<Vec<SavedWindow>, BridgeError> {
        let storage_js = getStorage(key)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to get {key}: {}", js_message(&e))))?;

        if storage_js.is_null() || storage_js.is_undefined() {
            Ok(Vec::new())
        } else {
            serde_wasm_bindgen::from_value(storage_js).map_err(|e| BridgeError::decode("saved windows", e.to_string()))
        }
    }

    async fn save(&self, key: &str, windows: &[SavedWindow]) -> Result<(), BridgeError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let storage_js = windows
            .serialize(&serializer)
            .map_err(|e| BridgeError::decode("saved windows", e.to_string()))?;

        setStorage(key, storage_js)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to set {key}: {}", js_message(&e))))
    }
}
