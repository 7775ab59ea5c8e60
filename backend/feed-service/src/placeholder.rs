//! Fast path: one cheap recency query per scope, memoized for the
//! session so the UI can paint immediately on every scope activation.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::FastCache;
use crate::models::{ContentItem, Scope};
use crate::normalizer::normalize_rows;
use crate::store::ContentStore;

pub struct PlaceholderFetcher<S> {
    store: Arc<S>,
    cache: FastCache,
}

impl<S> Clone for PlaceholderFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}

impl<S: ContentStore> PlaceholderFetcher<S> {
    pub fn new(store: Arc<S>, cache: FastCache) -> Self {
        Self { store, cache }
    }

    /// Return a small recent page for the scope, from cache when the
    /// scope was fetched before. A query failure is logged and yields
    /// an empty list; this path never blocks rendering on an error.
    pub async fn fetch(&self, scope: &Scope, limit: usize) -> Vec<ContentItem> {
        let key = scope.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(scope = %key, "placeholder cache hit");
            return hit;
        }

        match self.store.recent_rows(scope.category(), limit).await {
            Ok(rows) => {
                let items = normalize_rows(&rows);
                self.cache.insert(key, items.clone());
                items
            }
            Err(e) => {
                warn!(scope = %key, "placeholder fetch failed: {}", e);
                Vec::new()
            }
        }
    }
}
