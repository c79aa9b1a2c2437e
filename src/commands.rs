/// Command dispatch between the UI/background pages and the browser
use std::cell::Cell;
use std::ops::AddAssign;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::BridgeError;
use crate::grouping::{WindowView, build_dashboard};
use crate::operations::{
    APPEND_INDEX, MoveInstruction, SortKey, plan_merge, plan_reorder, plan_reorder_ids, resolve_duplicates,
    search_tabs, unique_saved_tabs,
};
use crate::storage::{SavedWindowStore, default_window_name};
use crate::tab_data::{
    RawWindow, SavedTab, SavedWindow, SavedWindowId, Tab, TabId, WINDOW_ID_NONE, Window, WindowId,
    normalize_snapshot,
};

/// Extension page that hosts the dashboard
pub const MANAGER_PAGE: &str = "manager.html";

/// Tab and window operations of the host browser
#[async_trait(?Send)]
pub trait BrowserApi {
    /// All windows with their tabs
    async fn list_windows(&self) -> Result<Vec<RawWindow>, BridgeError>;

    /// Move one tab; an index of -1 appends it
    async fn move_tab(&self, tab_id: TabId, window_id: WindowId, index: i32) -> Result<(), BridgeError>;

    async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), BridgeError>;

    async fn focus_tab(&self, tab_id: TabId, window_id: WindowId) -> Result<(), BridgeError>;

    /// Open a new window holding the given tabs
    async fn open_window(&self, tabs: &[SavedTab]) -> Result<(), BridgeError>;

    /// Focus the tab showing an extension page, opening one if none exists
    async fn open_or_focus_page(&self, path: &str) -> Result<(), BridgeError>;
}

/// Durable key-value storage for saved windows
#[async_trait(?Send)]
pub trait SessionStore {
    /// Missing keys load as an empty list
    async fn load(&self, key: &str) -> Result<Vec<SavedWindow>, BridgeError>;

    async fn save(&self, key: &str, windows: &[SavedWindow]) -> Result<(), BridgeError>;
}

/// Messages accepted from the extension pages, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    GetAllWindows,
    GetDashboard,
    CloseTab {
        tab_id: TabId,
    },
    CloseTabs {
        tab_ids: Vec<TabId>,
    },
    FocusTab {
        tab_id: TabId,
        window_id: WindowId,
    },
    MoveTabToWindow {
        tab_id: TabId,
        target_window_id: WindowId,
    },
    SortTabsInWindow {
        window_id: WindowId,
        sorted_tab_ids: Vec<TabId>,
    },
    SortCurrentWindow,
    SortAllWindows,
    RemoveDuplicates,
    MergeAllWindows,
    SearchTabs {
        query: String,
    },
    GetSavedWindows,
    SaveWindow {
        #[serde(default)]
        window_id: Option<WindowId>,
        #[serde(default)]
        name: Option<String>,
    },
    RestoreWindow {
        window_id: SavedWindowId,
    },
    DeleteWindow {
        window_id: SavedWindowId,
    },
    RenameSavedWindow {
        window_id: SavedWindowId,
        name: String,
    },
    SetSortKey {
        key: SortKey,
    },
    OpenManager,
}

impl Command {
    /// Map a keyboard shortcut from the manifest's `commands` section
    pub fn from_shortcut(name: &str) -> Option<Command> {
        match name {
            "sort-tabs" => Some(Command::SortCurrentWindow),
            "open-manager" => Some(Command::OpenManager),
            _ => None,
        }
    }
}

/// How many instructions of a batch went through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub applied: usize,
    pub failed: usize,
}

impl AddAssign for ExecutionReport {
    fn add_assign(&mut self, other: ExecutionReport) {
        self.applied += other.applied;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Response {
    Done,
    Windows(Vec<Window>),
    Dashboard(Vec<WindowView>),
    Tabs(Vec<Tab>),
    SavedWindows(Vec<SavedWindow>),
    Saved(SavedWindow),
    Moved(ExecutionReport),
    Removed(ExecutionReport),
}

/// Owns the orchestration state and turns commands into browser instructions
pub struct TabManager<B, S> {
    browser: B,
    store: S,
    config: Config,
    sort_key: Cell<SortKey>,
    clock: fn() -> f64,
}

impl<B: BrowserApi, S: SessionStore> TabManager<B, S> {
    /// `clock` returns milliseconds since the Unix epoch
    pub fn new(browser: B, store: S, config: Config, clock: fn() -> f64) -> Self {
        let sort_key = Cell::new(config.sort_key);
        TabManager {
            browser,
            store,
            config,
            sort_key,
            clock,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key.get()
    }

    pub async fn dispatch(&self, command: Command) -> Result<Response, BridgeError> {
        debug!("Dispatching {:?}", command);

        match command {
            Command::GetAllWindows => Ok(Response::Windows(self.snapshot().await?)),
            Command::GetDashboard => {
                let windows = self.snapshot().await?;
                Ok(Response::Dashboard(build_dashboard(&windows, self.config.min_group_size)))
            }
            Command::CloseTab { tab_id } => Ok(Response::Removed(self.close_tabs(&[tab_id]).await)),
            Command::CloseTabs { tab_ids } => Ok(Response::Removed(self.close_tabs(&tab_ids).await)),
            Command::FocusTab { tab_id, window_id } => {
                self.browser.focus_tab(tab_id, window_id).await?;
                Ok(Response::Done)
            }
            Command::MoveTabToWindow { tab_id, target_window_id } => {
                let instruction = MoveInstruction {
                    tab_id,
                    window_id: target_window_id,
                    index: APPEND_INDEX,
                };
                Ok(Response::Moved(self.apply_moves(&[instruction]).await))
            }
            Command::SortTabsInWindow { window_id, sorted_tab_ids } => {
                let moves = plan_reorder_ids(window_id, &sorted_tab_ids);
                Ok(Response::Moved(self.apply_moves(&moves).await))
            }
            Command::SortCurrentWindow => {
                let windows = self.snapshot().await?;
                let report = match current_window(&windows) {
                    Some(window) => self.apply_moves(&plan_reorder(window, self.sort_key())).await,
                    None => ExecutionReport::default(),
                };
                info!("Sorted current window: {} moved, {} failed", report.applied, report.failed);
                Ok(Response::Moved(report))
            }
            Command::SortAllWindows => {
                let windows = self.snapshot().await?;
                let key = self.sort_key();
                let mut report = ExecutionReport::default();
                for window in &windows {
                    report += self.apply_moves(&plan_reorder(window, key)).await;
                }
                info!("Sorted {} windows: {} moved, {} failed", windows.len(), report.applied, report.failed);
                Ok(Response::Moved(report))
            }
            Command::RemoveDuplicates => {
                let windows = self.snapshot().await?;
                let resolution = resolve_duplicates(&windows);
                let report = self.close_tabs(&resolution.remove).await;
                info!("Removed {} duplicate tabs", report.applied);
                Ok(Response::Removed(report))
            }
            Command::MergeAllWindows => {
                let windows = self.snapshot().await?;
                let report = match current_window(&windows) {
                    Some(target) => self.apply_moves(&plan_merge(&windows, target.id)).await,
                    None => ExecutionReport::default(),
                };
                info!("Merged windows: {} tabs moved", report.applied);
                Ok(Response::Moved(report))
            }
            Command::SearchTabs { query } => {
                if query.trim().is_empty() {
                    return Ok(Response::Tabs(Vec::new()));
                }
                let windows = self.snapshot().await?;
                Ok(Response::Tabs(search_tabs(&windows, &query)))
            }
            Command::GetSavedWindows => Ok(Response::SavedWindows(self.load_store().await?.into_windows())),
            Command::SaveWindow { window_id, name } => {
                let saved = self.save_window(window_id, name).await?;
                Ok(Response::Saved(saved))
            }
            Command::RestoreWindow { window_id } => {
                let store = self.load_store().await?;
                let saved = store
                    .get_window(window_id)
                    .ok_or(BridgeError::SavedWindowNotFound(window_id))?;
                self.browser.open_window(&saved.tabs).await?;
                info!("Restored saved window {} ({} tabs)", saved.id, saved.tabs.len());
                Ok(Response::Done)
            }
            Command::DeleteWindow { window_id } => {
                let mut store = self.load_store().await?;
                if store.remove_window(window_id) {
                    self.persist(&store).await?;
                } else {
                    warn!("Saved window {} already gone", window_id);
                }
                Ok(Response::SavedWindows(store.into_windows()))
            }
            Command::RenameSavedWindow { window_id, name } => {
                let mut store = self.load_store().await?;
                if !store.rename_window(window_id, name) {
                    return Err(BridgeError::SavedWindowNotFound(window_id));
                }
                self.persist(&store).await?;
                Ok(Response::SavedWindows(store.into_windows()))
            }
            Command::SetSortKey { key } => {
                self.sort_key.set(key);
                Ok(Response::Done)
            }
            Command::OpenManager => {
                self.browser.open_or_focus_page(MANAGER_PAGE).await?;
                Ok(Response::Done)
            }
        }
    }

    /// Fresh snapshot of the ordinary windows
    pub async fn snapshot(&self) -> Result<Vec<Window>, BridgeError> {
        let raw = self.browser.list_windows().await?;
        Ok(normalize_snapshot(raw))
    }

    /// Apply moves one at a time; a failed move is logged and skipped
    async fn apply_moves(&self, moves: &[MoveInstruction]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for instruction in moves {
            match self
                .browser
                .move_tab(instruction.tab_id, instruction.window_id, instruction.index)
                .await
            {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!("Skipping move of tab {}: {}", instruction.tab_id, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Close in one call; when the browser rejects the batch, retry tab by tab
    async fn close_tabs(&self, tab_ids: &[TabId]) -> ExecutionReport {
        if tab_ids.is_empty() {
            return ExecutionReport::default();
        }
        let Err(e) = self.browser.close_tabs(tab_ids).await else {
            return ExecutionReport {
                applied: tab_ids.len(),
                failed: 0,
            };
        };

        warn!("Closing {} tabs at once failed, retrying one by one: {}", tab_ids.len(), e);
        let mut report = ExecutionReport::default();
        for &tab_id in tab_ids {
            match self.browser.close_tabs(&[tab_id]).await {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!("Skipping close of tab {}: {}", tab_id, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn save_window(&self, window_id: Option<WindowId>, name: Option<String>) -> Result<SavedWindow, BridgeError> {
        let windows = self.snapshot().await?;
        let window = match window_id {
            Some(id) => windows
                .iter()
                .find(|window| window.id == id)
                .ok_or(BridgeError::WindowNotFound(id))?,
            None => current_window(&windows).ok_or(BridgeError::WindowNotFound(WINDOW_ID_NONE))?,
        };

        let mut tabs: Vec<SavedTab> = window.tabs.iter().map(Tab::to_saved).collect();
        if self.config.dedupe_saved_tabs {
            tabs = unique_saved_tabs(&tabs);
        }

        let now = (self.clock)();
        let mut store = self.load_store().await?;
        let saved = SavedWindow {
            id: store.next_id(now),
            name: name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| default_window_name(now)),
            tabs,
        };

        store.add_window(saved.clone());
        self.persist(&store).await?;
        info!("Saved window {} as {:?} ({} tabs)", window.id, saved.name, saved.tabs.len());
        Ok(saved)
    }

    async fn load_store(&self) -> Result<SavedWindowStore, BridgeError> {
        let windows = self.store.load(&self.config.storage_key).await?;
        Ok(SavedWindowStore::from_windows(windows))
    }

    async fn persist(&self, store: &SavedWindowStore) -> Result<(), BridgeError> {
        self.store.save(&self.config.storage_key, &store.windows).await
    }
}

/// The focused window, or the first one when none has focus
fn current_window(windows: &[Window]) -> Option<&Window> {
    windows
        .iter()
        .find(|window| window.focused)
        .or_else(|| windows.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab_data::{RawTab, WindowType};
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockBrowser {
        windows: Vec<RawWindow>,
        failing_tabs: Vec<TabId>,
        fail_close: bool,
        stale_tabs: Vec<TabId>,
        moves: RefCell<Vec<MoveInstruction>>,
        closed: RefCell<Vec<Vec<TabId>>>,
        focused: RefCell<Vec<(TabId, WindowId)>>,
        opened: RefCell<Vec<Vec<SavedTab>>>,
        pages: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl BrowserApi for MockBrowser {
        async fn list_windows(&self) -> Result<Vec<RawWindow>, BridgeError> {
            Ok(self.windows.clone())
        }

        async fn move_tab(&self, tab_id: TabId, window_id: WindowId, index: i32) -> Result<(), BridgeError> {
            if self.failing_tabs.contains(&tab_id) {
                return Err(BridgeError::browser("tabs.move", format!("No tab with id: {tab_id}")));
            }
            self.moves.borrow_mut().push(MoveInstruction { tab_id, window_id, index });
            Ok(())
        }

        async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), BridgeError> {
            if self.fail_close {
                return Err(BridgeError::browser("tabs.remove", "gone"));
            }
            // One unknown id rejects the whole batch
            if let Some(stale) = tab_ids.iter().find(|&&id| self.stale_tabs.contains(&id)) {
                return Err(BridgeError::browser("tabs.remove", format!("No tab with id: {stale}")));
            }
            self.closed.borrow_mut().push(tab_ids.to_vec());
            Ok(())
        }

        async fn focus_tab(&self, tab_id: TabId, window_id: WindowId) -> Result<(), BridgeError> {
            self.focused.borrow_mut().push((tab_id, window_id));
            Ok(())
        }

        async fn open_window(&self, tabs: &[SavedTab]) -> Result<(), BridgeError> {
            self.opened.borrow_mut().push(tabs.to_vec());
            Ok(())
        }

        async fn open_or_focus_page(&self, path: &str) -> Result<(), BridgeError> {
            self.pages.borrow_mut().push(path.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        data: RefCell<HashMap<String, Vec<SavedWindow>>>,
    }

    #[async_trait(?Send)]
    impl SessionStore for MemoryStore {
        async fn load(&self, key: &str) -> Result<Vec<SavedWindow>, BridgeError> {
            Ok(self.data.borrow().get(key).cloned().unwrap_or_default())
        }

        async fn save(&self, key: &str, windows: &[SavedWindow]) -> Result<(), BridgeError> {
            self.data.borrow_mut().insert(key.to_string(), windows.to_vec());
            Ok(())
        }
    }

    fn fixed_clock() -> f64 {
        1698508200000.0
    }

    fn raw_tab(id: TabId, url: &str, title: &str, active: bool) -> RawTab {
        RawTab {
            id: Some(id),
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            active,
            ..RawTab::default()
        }
    }

    fn raw_window(id: WindowId, focused: bool, tabs: Vec<RawTab>) -> RawWindow {
        RawWindow {
            id,
            focused,
            window_type: WindowType::Normal,
            always_on_top: false,
            tabs,
        }
    }

    fn create_manager(browser: MockBrowser) -> TabManager<MockBrowser, MemoryStore> {
        TabManager::new(browser, MemoryStore::default(), Config::default(), fixed_clock)
    }

    fn two_windows() -> Vec<RawWindow> {
        vec![
            raw_window(
                1,
                false,
                vec![
                    raw_tab(1, "https://c.com", "Charlie", false),
                    raw_tab(2, "https://a.com", "Alpha", false),
                ],
            ),
            raw_window(
                2,
                true,
                vec![
                    raw_tab(3, "https://b.com", "Bravo", true),
                    raw_tab(4, "https://a.com", "Alpha again", true),
                    raw_tab(5, "https://d.com", "Able", false),
                ],
            ),
        ]
    }

    #[test]
    fn test_command_wire_format() {
        let parse = |json: &str| serde_json::from_str::<Command>(json).unwrap();

        assert_eq!(parse(r#"{"action": "closeTab", "tabId": 3}"#), Command::CloseTab { tab_id: 3 });
        assert_eq!(parse(r#"{"action": "sortAllWindows"}"#), Command::SortAllWindows);
        assert_eq!(
            parse(r#"{"action": "sortTabsInWindow", "windowId": 2, "sortedTabIds": [5, 4]}"#),
            Command::SortTabsInWindow { window_id: 2, sorted_tab_ids: vec![5, 4] }
        );
        assert_eq!(parse(r#"{"action": "saveWindow"}"#), Command::SaveWindow { window_id: None, name: None });
        assert_eq!(
            parse(r#"{"action": "restoreWindow", "windowId": 1698508200000}"#),
            Command::RestoreWindow { window_id: 1698508200000 }
        );
        assert_eq!(parse(r#"{"action": "setSortKey", "key": "title"}"#), Command::SetSortKey { key: SortKey::Title });
        assert!(serde_json::from_str::<Command>(r#"{"action": "launchRockets"}"#).is_err());
    }

    #[test]
    fn test_from_shortcut() {
        assert_eq!(Command::from_shortcut("sort-tabs"), Some(Command::SortCurrentWindow));
        assert_eq!(Command::from_shortcut("open-manager"), Some(Command::OpenManager));
        assert_eq!(Command::from_shortcut("launch-rockets"), None);
    }

    #[test]
    fn test_response_wire_format() {
        let json = serde_json::to_value(Response::Removed(ExecutionReport { applied: 2, failed: 1 })).unwrap();
        assert_eq!(json, serde_json::json!({"type": "removed", "data": {"applied": 2, "failed": 1}}));

        let json = serde_json::to_value(Response::Done).unwrap();
        assert_eq!(json, serde_json::json!({"type": "done"}));
    }

    #[test]
    fn test_sort_all_windows_continues_after_failed_move() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            failing_tabs: vec![2],
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::SortAllWindows)).unwrap();

        assert_eq!(response, Response::Moved(ExecutionReport { applied: 4, failed: 1 }));
        assert_eq!(
            *manager.browser().moves.borrow(),
            vec![
                MoveInstruction { tab_id: 1, window_id: 1, index: 1 },
                MoveInstruction { tab_id: 4, window_id: 2, index: 0 },
                MoveInstruction { tab_id: 3, window_id: 2, index: 1 },
                MoveInstruction { tab_id: 5, window_id: 2, index: 2 },
            ]
        );
    }

    #[test]
    fn test_sort_current_window_uses_selected_key() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });

        block_on(manager.dispatch(Command::SetSortKey { key: SortKey::Title })).unwrap();
        block_on(manager.dispatch(Command::SortCurrentWindow)).unwrap();

        assert_eq!(manager.sort_key(), SortKey::Title);
        let moved: Vec<TabId> = manager.browser().moves.borrow().iter().map(|m| m.tab_id).collect();
        // Able, Alpha again, Bravo in the focused window
        assert_eq!(moved, vec![5, 4, 3]);
    }

    #[test]
    fn test_sort_tabs_in_window_uses_given_order() {
        let manager = create_manager(MockBrowser::default());

        block_on(manager.dispatch(Command::SortTabsInWindow { window_id: 9, sorted_tab_ids: vec![7, 3] })).unwrap();

        assert_eq!(
            *manager.browser().moves.borrow(),
            vec![
                MoveInstruction { tab_id: 7, window_id: 9, index: 0 },
                MoveInstruction { tab_id: 3, window_id: 9, index: 1 },
            ]
        );
    }

    #[test]
    fn test_remove_duplicates() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::RemoveDuplicates)).unwrap();

        // Tab 4 is active, so the inactive tab 2 goes
        assert_eq!(response, Response::Removed(ExecutionReport { applied: 1, failed: 0 }));
        assert_eq!(*manager.browser().closed.borrow(), vec![vec![2]]);
    }

    #[test]
    fn test_remove_duplicates_ignores_pip_windows() {
        let mut windows = two_windows();
        windows.push(RawWindow {
            always_on_top: true,
            ..raw_window(3, false, vec![raw_tab(9, "https://a.com", "", false)])
        });
        windows[1].tabs.remove(1);
        let manager = create_manager(MockBrowser {
            windows,
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::RemoveDuplicates)).unwrap();

        assert_eq!(response, Response::Removed(ExecutionReport::default()));
        assert!(manager.browser().closed.borrow().is_empty());
    }

    #[test]
    fn test_close_failure_is_reported_not_raised() {
        let manager = create_manager(MockBrowser {
            fail_close: true,
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::CloseTabs { tab_ids: vec![1, 2] })).unwrap();

        assert_eq!(response, Response::Removed(ExecutionReport { applied: 0, failed: 2 }));
    }

    #[test]
    fn test_stale_tab_does_not_block_closing_the_rest() {
        let manager = create_manager(MockBrowser {
            stale_tabs: vec![2],
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::CloseTabs { tab_ids: vec![1, 2, 3] })).unwrap();

        assert_eq!(response, Response::Removed(ExecutionReport { applied: 2, failed: 1 }));
        assert_eq!(*manager.browser().closed.borrow(), vec![vec![1], vec![3]]);
    }

    #[test]
    fn test_remove_duplicates_survives_stale_duplicate() {
        let mut windows = two_windows();
        windows[1].tabs.push(raw_tab(6, "https://b.com", "Bravo again", false));
        let manager = create_manager(MockBrowser {
            windows,
            stale_tabs: vec![2],
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::RemoveDuplicates)).unwrap();

        assert_eq!(response, Response::Removed(ExecutionReport { applied: 1, failed: 1 }));
        assert_eq!(*manager.browser().closed.borrow(), vec![vec![6]]);
    }

    #[test]
    fn test_open_manager_page() {
        let manager = create_manager(MockBrowser::default());

        let response = block_on(manager.dispatch(Command::OpenManager)).unwrap();

        assert_eq!(response, Response::Done);
        assert_eq!(*manager.browser().pages.borrow(), vec!["manager.html".to_string()]);
        assert_eq!(
            serde_json::from_str::<Command>(r#"{"action": "openManager"}"#).unwrap(),
            Command::OpenManager
        );
    }

    #[test]
    fn test_merge_all_windows_into_focused() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });

        let response = block_on(manager.dispatch(Command::MergeAllWindows)).unwrap();

        assert_eq!(response, Response::Moved(ExecutionReport { applied: 2, failed: 0 }));
        assert!(manager.browser().moves.borrow().iter().all(|m| m.window_id == 2 && m.index == APPEND_INDEX));
    }

    #[test]
    fn test_focus_and_move_tab() {
        let manager = create_manager(MockBrowser::default());

        block_on(manager.dispatch(Command::FocusTab { tab_id: 4, window_id: 2 })).unwrap();
        block_on(manager.dispatch(Command::MoveTabToWindow { tab_id: 4, target_window_id: 1 })).unwrap();

        assert_eq!(*manager.browser().focused.borrow(), vec![(4, 2)]);
        assert_eq!(
            *manager.browser().moves.borrow(),
            vec![MoveInstruction { tab_id: 4, window_id: 1, index: APPEND_INDEX }]
        );
    }

    #[test]
    fn test_search_and_dashboard() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });

        let Response::Tabs(tabs) = block_on(manager.dispatch(Command::SearchTabs { query: "ALPHA".to_string() })).unwrap() else {
            panic!("expected tabs");
        };
        assert_eq!(tabs.iter().map(|tab| tab.id).collect::<Vec<_>>(), vec![2, 4]);

        let Response::Dashboard(views) = block_on(manager.dispatch(Command::GetDashboard)).unwrap() else {
            panic!("expected dashboard");
        };
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].tab_count, 3);
        assert!(views[1].groups.iter().all(|group| group.is_catch_all()));
    }

    #[test]
    fn test_save_window_persists_under_storage_key() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });

        let first = block_on(manager.dispatch(Command::SaveWindow { window_id: None, name: None })).unwrap();
        let second = block_on(manager.dispatch(Command::SaveWindow {
            window_id: Some(1),
            name: Some("  Research ".to_string()),
        }))
        .unwrap();

        let Response::Saved(first) = first else { panic!("expected saved window") };
        let Response::Saved(second) = second else { panic!("expected saved window") };
        assert_eq!(first.id, 1698508200000);
        assert_eq!(first.name, "Window 2023-10-28 15:50:00");
        assert_eq!(first.tabs.len(), 3);
        assert_eq!(second.id, 1698508200001);
        assert_eq!(second.name, "Research");

        let stored = manager.store().data.borrow();
        assert_eq!(stored["savedWindows"], vec![first, second]);
    }

    #[test]
    fn test_save_unknown_window() {
        let manager = create_manager(MockBrowser::default());

        let result = block_on(manager.dispatch(Command::SaveWindow { window_id: Some(8), name: None }));
        assert!(matches!(result, Err(BridgeError::WindowNotFound(8))));

        let result = block_on(manager.dispatch(Command::SaveWindow { window_id: None, name: None }));
        assert!(matches!(result, Err(BridgeError::WindowNotFound(WINDOW_ID_NONE))));
    }

    #[test]
    fn test_save_window_dedupes_when_configured() {
        let mut windows = two_windows();
        windows[1].tabs.push(raw_tab(6, "https://b.com", "Bravo copy", false));
        let config = Config {
            dedupe_saved_tabs: true,
            ..Config::default()
        };
        let manager = TabManager::new(
            MockBrowser {
                windows,
                ..MockBrowser::default()
            },
            MemoryStore::default(),
            config,
            fixed_clock,
        );

        let Response::Saved(saved) = block_on(manager.dispatch(Command::SaveWindow { window_id: Some(2), name: None })).unwrap() else {
            panic!("expected saved window");
        };

        assert_eq!(saved.tabs.len(), 3);
    }

    #[test]
    fn test_restore_rename_delete_saved_window() {
        let manager = create_manager(MockBrowser {
            windows: two_windows(),
            ..MockBrowser::default()
        });
        let Response::Saved(saved) = block_on(manager.dispatch(Command::SaveWindow { window_id: Some(1), name: None })).unwrap() else {
            panic!("expected saved window");
        };

        block_on(manager.dispatch(Command::RestoreWindow { window_id: saved.id })).unwrap();
        assert_eq!(*manager.browser().opened.borrow(), vec![saved.tabs.clone()]);

        let missing = block_on(manager.dispatch(Command::RestoreWindow { window_id: 1 }));
        assert!(matches!(missing, Err(BridgeError::SavedWindowNotFound(1))));

        let renamed = block_on(manager.dispatch(Command::RenameSavedWindow {
            window_id: saved.id,
            name: "Reading".to_string(),
        }))
        .unwrap();
        let Response::SavedWindows(list) = renamed else { panic!("expected saved windows") };
        assert_eq!(list[0].name, "Reading");

        let deleted = block_on(manager.dispatch(Command::DeleteWindow { window_id: saved.id })).unwrap();
        assert_eq!(deleted, Response::SavedWindows(Vec::new()));
        assert_eq!(
            block_on(manager.dispatch(Command::GetSavedWindows)).unwrap(),
            Response::SavedWindows(Vec::new())
        );
    }
}
