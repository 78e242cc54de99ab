/// Data structures for browser tabs and tab events
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Browser-assigned tab identifier
pub type TabId = i32;

/// Cached metadata for a tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> TabInfo {
        TabInfo {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// A tab changed; `changed_url` is set only when the URL itself changed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    pub tab_id: TabId,
    #[serde(default)]
    pub changed_url: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabUpdate {
    /// Only URL changes on the active tab refresh the cache.
    pub fn is_active_url_change(&self) -> bool {
        self.active && self.changed_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// A navigation finished loading in some frame of a tab.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDetails {
    pub tab_id: TabId,
    pub frame_id: i32,
    #[serde(default)]
    pub url: String,
}

impl NavigationDetails {
    pub fn is_top_level(&self) -> bool {
        self.frame_id == 0
    }
}

/// Volatile tab id → TabInfo map, alive as long as the worker process.
///
/// Entries for tabs closed while not tracked are never removed.
#[derive(Debug, Clone, Default)]
pub struct TabCache {
    tabs: HashMap<TabId, TabInfo>,
}

impl TabCache {
    pub fn insert(&mut self, tab_id: TabId, info: TabInfo) {
        self.tabs.insert(tab_id, info);
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TabInfo> {
        self.tabs.get(&tab_id)
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<TabInfo> {
        self.tabs.remove(&tab_id)
    }

    #[cfg(test)]
    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
