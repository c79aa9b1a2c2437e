/// Data structures for Tab Atlas
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type WindowId = i32;
pub type SavedWindowId = i64;

/// Mirrors `chrome.windows.WINDOW_ID_NONE`
pub const WINDOW_ID_NONE: WindowId = -1;

/// Shown in place of an empty tab title
pub const UNTITLED: &str = "Untitled";

/// Common view over live tabs and saved tabs, used by the sorter and grouper
pub trait TabLike {
    fn url(&self) -> &str;
    fn title(&self) -> &str;

    /// Final tie-break for sorting; tabs without an id keep their input order
    fn tab_id(&self) -> Option<TabId> {
        None
    }
}

/// A browser tab as reported by `chrome.windows.getAll({ populate: true })`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTab {
    pub id: Option<TabId>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub fav_icon_url: Option<String>,
    pub active: bool,
    pub pinned: bool,
    pub audible: bool,
    pub muted_info: Option<RawMutedInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMutedInfo {
    pub muted: bool,
}

/// A browser window as reported by `chrome.windows.getAll({ populate: true })`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawWindow {
    pub id: WindowId,
    pub focused: bool,
    #[serde(rename = "type")]
    pub window_type: WindowType,
    pub always_on_top: bool,
    pub tabs: Vec<RawTab>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowType {
    #[default]
    Normal,
    Popup,
    Panel,
    App,
    Devtools,
    #[serde(other)]
    Unknown,
}

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    pub url: String,
    pub title: String,
    pub fav_icon_url: Option<String>,
    pub active: bool,
    pub pinned: bool,
    pub audible: bool,
    pub muted: bool,
}

impl Tab {
    /// Normalize a raw tab. Tabs without an id cannot be moved or closed and are dropped.
    pub fn from_raw(raw: RawTab, window_id: WindowId) -> Option<Tab> {
        let id = raw.id?;
        Some(Tab {
            id,
            window_id,
            url: raw.url.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            fav_icon_url: raw.fav_icon_url.filter(|icon| !icon.is_empty()),
            active: raw.active,
            pinned: raw.pinned,
            audible: raw.audible,
            muted: raw.muted_info.is_some_and(|info| info.muted),
        })
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { UNTITLED } else { &self.title }
    }

    /// Project onto the shape persisted in a saved window
    pub fn to_saved(&self) -> SavedTab {
        SavedTab {
            url: self.url.clone(),
            title: self.title.clone(),
            fav_icon_url: self.fav_icon_url.clone(),
            pinned: self.pinned,
        }
    }
}

impl TabLike for Tab {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn tab_id(&self) -> Option<TabId> {
        Some(self.id)
    }
}

/// An open browser window with its tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    pub focused: bool,
    pub window_type: WindowType,
    pub always_on_top: bool,
    pub tabs: Vec<Tab>,
}

impl Window {
    pub fn from_raw(raw: RawWindow) -> Window {
        let id = raw.id;
        Window {
            id,
            focused: raw.focused,
            window_type: raw.window_type,
            always_on_top: raw.always_on_top,
            tabs: raw
                .tabs
                .into_iter()
                .filter_map(|tab| Tab::from_raw(tab, id))
                .collect(),
        }
    }

    /// Picture-in-picture (always on top), app and popup windows are not ordinary
    pub fn is_ordinary(&self) -> bool {
        self.window_type == WindowType::Normal && !self.always_on_top
    }
}

/// Normalize a full snapshot, keeping only ordinary windows
pub fn normalize_snapshot(raw: Vec<RawWindow>) -> Vec<Window> {
    raw.into_iter()
        .map(Window::from_raw)
        .filter(Window::is_ordinary)
        .collect()
}

pub fn ordinary_windows(windows: &[Window]) -> impl Iterator<Item = &Window> {
    windows.iter().filter(|window| window.is_ordinary())
}

/// A saved window session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWindow {
    pub id: SavedWindowId,
    pub name: String,
    pub tabs: Vec<SavedTab>,
}

/// A saved tab within a saved window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl TabLike for SavedTab {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }
}
