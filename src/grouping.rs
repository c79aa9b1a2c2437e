/// Domain grouping for the dashboard
use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{DomainKey, extract_domain};
use crate::operations::{SortKey, sort_tabs};
use crate::tab_data::{Tab, TabLike, Window, WindowId, ordinary_windows};

/// Smallest bucket that gets its own group; smaller ones fold into "other"
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;

/// Tabs sharing a domain, ordered by URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainGroup<T = Tab> {
    pub domain: DomainKey,
    pub tabs: Vec<T>,
}

impl<T> DomainGroup<T> {
    pub fn is_catch_all(&self) -> bool {
        self.domain.is_other()
    }
}

/// Group tabs by domain with the default minimum group size
pub fn group_by_domain<T: TabLike + Clone>(tabs: &[T]) -> Vec<DomainGroup<T>> {
    group_by_domain_with_min(tabs, DEFAULT_MIN_GROUP_SIZE)
}

/// Group tabs by domain
///
/// Domains with at least `min_group_size` tabs become groups, ordered by
/// domain. Everything else (smaller domains and unparseable URLs) lands in a
/// single catch-all group that always comes last. Tabs inside every group
/// are sorted by URL. Every input tab appears in exactly one group.
pub fn group_by_domain_with_min<T: TabLike + Clone>(tabs: &[T], min_group_size: usize) -> Vec<DomainGroup<T>> {
    let min_group_size = min_group_size.max(1);

    // BTreeMap keeps the buckets in domain order
    let mut buckets: BTreeMap<String, Vec<T>> = BTreeMap::new();
    let mut other: Vec<T> = Vec::new();

    for tab in tabs {
        match extract_domain(tab.url()) {
            DomainKey::Host(host) => buckets.entry(host).or_default().push(tab.clone()),
            DomainKey::Other => other.push(tab.clone()),
        }
    }

    let mut groups = Vec::with_capacity(buckets.len() + 1);
    for (host, bucket) in buckets {
        if bucket.len() >= min_group_size {
            groups.push(DomainGroup {
                domain: DomainKey::Host(host),
                tabs: sort_tabs(&bucket, SortKey::Url),
            });
        } else {
            other.extend(bucket);
        }
    }

    if !other.is_empty() {
        groups.push(DomainGroup {
            domain: DomainKey::Other,
            tabs: sort_tabs(&other, SortKey::Url),
        });
    }

    groups
}

/// One window card on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub window_id: WindowId,
    pub focused: bool,
    pub tab_count: usize,
    pub groups: Vec<DomainGroup>,
}

/// Group every ordinary window's tabs, keeping snapshot window order
pub fn build_dashboard(windows: &[Window], min_group_size: usize) -> Vec<WindowView> {
    ordinary_windows(windows)
        .map(|window| WindowView {
            window_id: window.id,
            focused: window.focused,
            tab_count: window.tabs.len(),
            groups: group_by_domain_with_min(&window.tabs, min_group_size),
        })
        .collect()
}
