/// Tab operations: sorting, duplicate resolution and instruction planning
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::Entry;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};

use crate::domain::extract_domain;
use crate::tab_data::{SavedTab, Tab, TabId, TabLike, Window, WindowId, ordinary_windows};

/// Target index that appends a moved tab after the last tab of a window
pub const APPEND_INDEX: i32 = -1;

/// Field a tab sequence can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Domain,
    Title,
    #[default]
    Url,
}

impl SortKey {
    fn value_of<T: TabLike>(self, tab: &T) -> String {
        match self {
            SortKey::Domain => extract_domain(tab.url()).as_str().to_string(),
            SortKey::Title => tab.title().to_string(),
            SortKey::Url => tab.url().to_string(),
        }
    }
}

/// Root-locale collator that ignores case but not accents
fn key_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    Collator::try_new(&Default::default(), options)
        .map_err(|e| log::warn!("Collator unavailable, sorting by code point: {e}"))
        .ok()
}

/// Sort tabs by the given key, returning a new sequence
///
/// Keys are compared case-insensitively with Unicode collation, so accented
/// letters sort next to their base letter and punctuation sorts before
/// letters. Equal keys fall back to code point order, then the case-sensitive
/// key and then the tab id, so live tabs always sort the same way regardless
/// of snapshot order. Tabs without an id keep their relative input order.
pub fn sort_tabs<T: TabLike + Clone>(tabs: &[T], key: SortKey) -> Vec<T> {
    // Precompute the key once per tab
    let mut keyed: Vec<(String, String, &T)> = tabs
        .iter()
        .map(|tab| {
            let value = key.value_of(tab);
            (value.to_lowercase(), value, tab)
        })
        .collect();

    let collator = key_collator();
    let collate = |a: &str, b: &str| match &collator {
        Some(collator) => collator.compare(a, b),
        None => Ordering::Equal,
    };

    keyed.sort_by(|a, b| {
        collate(&a.0, &b.0)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.tab_id().cmp(&b.2.tab_id()))
    });

    keyed.into_iter().map(|(_, _, tab)| tab.clone()).collect()
}

/// Outcome of a duplicate scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateResolution {
    /// The surviving tab for every distinct URL
    pub keep: HashMap<String, Tab>,
    /// Tabs to close, in the order they were evicted
    pub remove: Vec<TabId>,
}

/// Decide which tabs survive when several share the exact same URL
///
/// Windows and tabs are scanned in snapshot order; only ordinary windows take
/// part. The first tab seen for a URL is kept unless a later duplicate is
/// active while the kept one is not, in which case the active tab takes over.
/// Between two inactive (or two active) copies the earlier one wins.
pub fn resolve_duplicates(windows: &[Window]) -> DuplicateResolution {
    let mut resolution = DuplicateResolution::default();

    for tab in ordinary_windows(windows).flat_map(|window| window.tabs.iter()) {
        match resolution.keep.entry(tab.url.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(tab.clone());
            }
            Entry::Occupied(mut slot) => {
                if tab.active && !slot.get().active {
                    let evicted = slot.insert(tab.clone());
                    resolution.remove.push(evicted.id);
                } else {
                    resolution.remove.push(tab.id);
                }
            }
        }
    }

    resolution
}

/// Make saved tabs unique by URL (keep first occurrence)
pub fn unique_saved_tabs(tabs: &[SavedTab]) -> Vec<SavedTab> {
    let mut seen_urls = HashSet::new();
    tabs.iter()
        .filter(|tab| seen_urls.insert(tab.url.clone()))
        .cloned()
        .collect()
}

/// A single tab move for the browser to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInstruction {
    pub tab_id: TabId,
    pub window_id: WindowId,
    pub index: i32,
}

/// Moves that put a window's tabs into sorted order, in ascending index order
pub fn plan_reorder(window: &Window, key: SortKey) -> Vec<MoveInstruction> {
    let sorted_ids: Vec<TabId> = sort_tabs(&window.tabs, key).iter().map(|tab| tab.id).collect();
    plan_reorder_ids(window.id, &sorted_ids)
}

/// Moves that put the given tab ids at indexes 0..n of a window
pub fn plan_reorder_ids(window_id: WindowId, sorted_ids: &[TabId]) -> Vec<MoveInstruction> {
    sorted_ids
        .iter()
        .zip(0..)
        .map(|(&tab_id, index)| MoveInstruction { tab_id, window_id, index })
        .collect()
}

/// Moves that gather every tab of the other ordinary windows into the target
///
/// Returns nothing when there is only one ordinary window, or when the target
/// is not an ordinary window itself.
pub fn plan_merge(windows: &[Window], target: WindowId) -> Vec<MoveInstruction> {
    let ordinary: Vec<&Window> = ordinary_windows(windows).collect();
    if ordinary.len() <= 1 || !ordinary.iter().any(|window| window.id == target) {
        return Vec::new();
    }

    ordinary
        .into_iter()
        .filter(|window| window.id != target)
        .flat_map(|window| window.tabs.iter())
        .map(|tab| MoveInstruction {
            tab_id: tab.id,
            window_id: target,
            index: APPEND_INDEX,
        })
        .collect()
}

/// Tabs whose title or URL contains the query (case-insensitive), sorted by domain
pub fn search_tabs(windows: &[Window], query: &str) -> Vec<Tab> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let matches: Vec<Tab> = ordinary_windows(windows)
        .flat_map(|window| window.tabs.iter())
        .filter(|tab| {
            tab.title.to_lowercase().contains(&query) || tab.url.to_lowercase().contains(&query)
        })
        .cloned()
        .collect();

    sort_tabs(&matches, SortKey::Domain)
}
