/// Domain extraction and counting logic for Tab Atlas
use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

use crate::tab_data::TabLike;

/// Rendered name of the catch-all domain
pub const OTHER_DOMAIN: &str = "other";

/// Grouping key derived from a tab URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainKey {
    /// Lowercased hostname
    Host(String),
    /// Unparseable URL, or a URL with no host
    Other,
}

impl DomainKey {
    pub fn as_str(&self) -> &str {
        match self {
            DomainKey::Host(host) => host,
            DomainKey::Other => OTHER_DOMAIN,
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, DomainKey::Other)
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DomainKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Extract the grouping key from a URL
///
/// Total over all strings: anything that does not parse as an absolute URL,
/// or parses without a hostname (`about:blank`, `data:` URLs), maps to
/// [`DomainKey::Other`].
///
/// Examples:
/// - https://www.google.com/search → www.google.com
/// - https://News.BBC.co.uk/article → news.bbc.co.uk
/// - http://localhost:3000 → localhost
/// - not-a-url → other
pub fn extract_domain(url: &str) -> DomainKey {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .filter(|host| !host.is_empty())
        .map_or(DomainKey::Other, DomainKey::Host)
}

/// String form of [`extract_domain`]
pub fn extract_domain_str(url: &str) -> String {
    extract_domain(url).as_str().to_string()
}

/// Count domain occurrences across tabs
pub fn count_domains<T: TabLike>(tabs: &[T]) -> HashMap<DomainKey, usize> {
    tabs.iter()
        .map(|tab| extract_domain(tab.url()))
        .fold(HashMap::new(), |mut counts, domain| {
            *counts.entry(domain).or_insert(0) += 1;
            counts
        })
}

/// Get the top N domains by count
pub fn top_domains(counts: &HashMap<DomainKey, usize>, n: usize) -> Vec<(DomainKey, usize)> {
    let mut domain_vec: Vec<(DomainKey, usize)> = counts
        .iter()
        .map(|(domain, count)| (domain.clone(), *count))
        .collect();

    // Sort by count descending, then by domain name ascending
    domain_vec.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    domain_vec.into_iter().take(n).collect()
}
