use serde::{Deserialize, Serialize};

/// Returns the breadcrumb key for a navigation depth
///
/// Depth 0 is "Category", depth 1 "SubCategory", deeper levels are numbered
/// from 2 ("SubCategory2", "SubCategory3", ...).
pub fn label_key(depth: usize) -> String {
    match depth {
        0 => "Category".to_string(),
        1 => "SubCategory".to_string(),
        n => format!("SubCategory{}", n),
    }
}

/// Context carried by one branch of a crawl
///
/// A state is created once per root task and forked into an independent
/// value for every child branch. Forking copies; the parent is never
/// observed to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Breadcrumb labels in insertion order
    labels: Vec<(String, String)>,

    /// Records yielded so far along the pagination chain
    item_index: u64,
}

impl CrawlState {
    /// Creates the state for a root task: no labels, index 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Forks a child carrying one more label
    ///
    /// If the key already exists the child shadows it; the parent keeps its
    /// value.
    pub fn with_label(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let mut child = self.clone();
        match child.labels.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => child.labels.push((key, value)),
        }
        child
    }

    /// Forks a child with the given item index
    pub fn with_item_index(&self, item_index: u64) -> Self {
        Self {
            labels: self.labels.clone(),
            item_index,
        }
    }

    /// Forks a child positioned at the start of a new listing chain
    pub fn restart_pagination(&self) -> Self {
        self.with_item_index(0)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    pub fn item_index(&self) -> u64 {
        self.item_index
    }

    /// Breadcrumb values, outermost first
    pub fn breadcrumb(&self) -> Vec<String> {
        self.labels.iter().map(|(_, v)| v.clone()).collect()
    }
}
