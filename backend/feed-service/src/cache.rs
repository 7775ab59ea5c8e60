//! Session-scoped cache for fast-path placeholder lists.
//!
//! Cache keys follow the pattern:
//! - `global` → placeholder page across all scopes
//! - `cat:<name>` → placeholder page for one category
//!
//! Entries are never invalidated or evicted for the lifetime of the
//! orchestrator instance; they only exist to avoid repeating the cheap
//! recency query within one session.

use dashmap::DashMap;
use std::sync::Arc;

use crate::models::ContentItem;

/// In-memory placeholder cache, cheap to clone and share across tasks.
#[derive(Clone, Default)]
pub struct FastCache {
    entries: Arc<DashMap<String, Vec<ContentItem>>>,
}

impl FastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<ContentItem>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn insert(&self, key: String, items: Vec<ContentItem>) {
        self.entries.insert(key, items);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
