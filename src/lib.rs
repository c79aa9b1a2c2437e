/// Tab Atlas - Chrome Extension for Window and Tab Management
/// Built with Rust + WASM + Yew

mod bridge;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod grouping;
pub mod operations;
pub mod storage;
pub mod tab_data;
pub mod ui;

use std::cell::OnceCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::bridge::{ChromeBrowser, ChromeStorage};
use crate::commands::{Command, TabManager};
use crate::config::Config;

type ChromeManager = TabManager<ChromeBrowser, ChromeStorage>;

thread_local! {
    // One manager per background worker; its sort key survives between messages
    static MANAGER: OnceCell<Rc<ChromeManager>> = const { OnceCell::new() };
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
    log::set_max_level(Config::default().level().to_level_filter());
}

/// Stored settings, applied to the log filter as they load
async fn load_config() -> Config {
    let config = bridge::load_config().await;
    log::set_max_level(config.level().to_level_filter());
    config
}

/// The background manager, built from stored settings on first use
async fn manager() -> Rc<ChromeManager> {
    if let Some(manager) = MANAGER.with(|cell| cell.get().cloned()) {
        return manager;
    }
    let config = load_config().await;
    let manager = Rc::new(TabManager::new(ChromeBrowser, ChromeStorage, config, js_sys::Date::now));
    MANAGER.with(|cell| Rc::clone(cell.get_or_init(|| manager)))
}

// Re-export core domain functions for JavaScript access
#[wasm_bindgen]
pub fn extract_domain(url: &str) -> String {
    domain::extract_domain_str(url)
}

/// Handle a `chrome.runtime.onMessage` request such as `{ action: "removeDuplicates" }`
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> Result<JsValue, JsValue> {
    let command: Command = serde_wasm_bindgen::from_value(message)
        .map_err(|e| JsValue::from_str(&format!("Invalid message: {}", e)))?;
    respond(command).await
}

/// Handle a `chrome.commands.onCommand` keyboard shortcut
#[wasm_bindgen]
pub async fn handle_shortcut(name: String) -> Result<JsValue, JsValue> {
    match Command::from_shortcut(&name) {
        Some(command) => respond(command).await,
        None => {
            log::debug!("Ignoring shortcut {}", name);
            Ok(JsValue::NULL)
        }
    }
}

async fn respond(command: Command) -> Result<JsValue, JsValue> {
    let manager = manager().await;
    let response = manager
        .dispatch(command)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    response
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize response: {}", e)))
}

// Start the Yew app for the manager page
#[wasm_bindgen]
pub async fn start_dashboard() {
    let config = load_config().await;
    yew::Renderer::<ui::Dashboard>::with_props(ui::DashboardProps { config }).render();
}
