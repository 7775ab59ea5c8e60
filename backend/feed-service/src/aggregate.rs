//! Heavy path: the four ranked lists for a scope, fetched in parallel.
//!
//! Each list prefers the server-side ranked procedure and silently
//! degrades to a bounded scan plus a client-side sort with the same
//! semantics. A block fetch always succeeds; the worst case is four
//! empty lists. A small elapsed-time floor keeps very fast responses
//! from making the placeholder-to-heavy swap look like a flicker.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::{ContentItem, Scope, ScopeBlock};
use crate::normalizer::normalize_rows;
use crate::store::{ContentStore, Ranking};

pub struct AggregateFetcher<S> {
    store: Arc<S>,
    /// Items per ranked list
    limit: usize,
    /// Row cap for the fallback scan
    scan_cap: usize,
    /// Minimum elapsed time before a block is returned
    min_elapsed: Duration,
}

impl<S> Clone for AggregateFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            limit: self.limit,
            scan_cap: self.scan_cap,
            min_elapsed: self.min_elapsed,
        }
    }
}

impl<S: ContentStore> AggregateFetcher<S> {
    pub fn new(store: Arc<S>, limit: usize, scan_cap: usize, min_elapsed: Duration) -> Self {
        Self {
            store,
            limit,
            scan_cap,
            min_elapsed,
        }
    }

    /// Fetch a whole scope block. Never errors.
    pub async fn fetch_block(&self, scope: &Scope) -> ScopeBlock {
        let start = Instant::now();
        let (newest, most_liked, highest_rated, most_viewed) = futures::join!(
            self.ranked(Ranking::Newest, scope),
            self.ranked(Ranking::MostLiked, scope),
            self.ranked(Ranking::HighestRated, scope),
            self.ranked(Ranking::MostViewed, scope),
        );

        let elapsed = start.elapsed();
        if elapsed < self.min_elapsed {
            tokio::time::sleep(self.min_elapsed - elapsed).await;
        }

        ScopeBlock {
            scope: scope.clone(),
            newest,
            most_liked,
            highest_rated,
            most_viewed,
        }
    }

    /// One ranked list: procedure first, scan-and-sort on any failure
    /// or unusable payload.
    async fn ranked(&self, ranking: Ranking, scope: &Scope) -> Vec<ContentItem> {
        let category = scope.category();
        match self.store.ranked_rpc(ranking, category, self.limit).await {
            Ok(rows) if !rows.is_empty() => return normalize_rows(&rows),
            Ok(_) => {
                debug!(rpc = ranking.rpc_name(), "ranked rpc returned no usable payload, falling back");
            }
            Err(e) if e.is_unavailable() => {
                debug!(rpc = ranking.rpc_name(), "ranked rpc unavailable, falling back");
            }
            Err(e) => {
                warn!(rpc = ranking.rpc_name(), "ranked rpc failed, falling back: {}", e);
            }
        }

        match self.store.scan_rows(category, self.scan_cap).await {
            Ok(rows) => {
                let mut items = normalize_rows(&rows);
                ranking.sort(&mut items);
                items.truncate(self.limit);
                items
            }
            Err(e) => {
                warn!(rpc = ranking.rpc_name(), "fallback scan failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockContentStore;
    use serde_json::json;
    use supabase_rest::StoreError;

    fn row(id: &str, created_at: &str, likes: u64, rating: f64, views: u64) -> serde_json::Value {
        json!({
            "id": id,
            "created_at": created_at,
            "likes_count": likes,
            "avg_rating": rating,
            "views_count": views,
        })
    }

    #[tokio::test]
    async fn test_rpc_rows_are_used_when_available() {
        let mut store = MockContentStore::new();
        store
            .expect_ranked_rpc()
            .times(4)
            .returning(|ranking, _, _| Ok(vec![json!({ "id": ranking.rpc_name() })]));
        store.expect_scan_rows().times(0);

        let fetcher = AggregateFetcher::new(Arc::new(store), 12, 500, Duration::ZERO);
        let block = fetcher.fetch_block(&Scope::Global).await;

        assert_eq!(block.newest[0].id, "get_newest");
        assert_eq!(block.most_liked[0].id, "get_top_liked");
        assert_eq!(block.highest_rated[0].id, "get_highest_rated");
        assert_eq!(block.most_viewed[0].id, "get_top_viewed");
    }

    #[tokio::test]
    async fn test_unavailable_rpc_falls_back_to_sorted_scan() {
        let mut store = MockContentStore::new();
        store.expect_ranked_rpc().times(4).returning(|_, _, _| {
            Err(StoreError::Status {
                status: 404,
                body: "function not found".into(),
            })
        });
        store.expect_scan_rows().times(4).returning(|_, _| {
            Ok(vec![
                row("old-liked", "2024-01-01T00:00:00Z", 50, 1.0, 5),
                row("new-viewed", "2024-06-01T00:00:00Z", 2, 3.0, 900),
                row("mid-rated", "2024-03-01T00:00:00Z", 10, 4.9, 40),
            ])
        });

        let fetcher = AggregateFetcher::new(Arc::new(store), 2, 500, Duration::ZERO);
        let block = fetcher.fetch_block(&Scope::Category("Finance".into())).await;

        assert_eq!(block.newest[0].id, "new-viewed");
        assert_eq!(block.most_liked[0].id, "old-liked");
        assert_eq!(block.highest_rated[0].id, "mid-rated");
        assert_eq!(block.most_viewed[0].id, "new-viewed");
        // truncated to the configured limit
        assert_eq!(block.newest.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_rpc_payload_triggers_fallback() {
        let mut store = MockContentStore::new();
        store.expect_ranked_rpc().returning(|_, _, _| Ok(Vec::new()));
        store
            .expect_scan_rows()
            .returning(|_, _| Ok(vec![row("only", "2024-01-01T00:00:00Z", 1, 1.0, 1)]));

        let fetcher = AggregateFetcher::new(Arc::new(store), 12, 500, Duration::ZERO);
        let block = fetcher.fetch_block(&Scope::Global).await;
        assert_eq!(block.newest.len(), 1);
    }

    #[tokio::test]
    async fn test_total_failure_yields_empty_block_not_error() {
        let mut store = MockContentStore::new();
        store.expect_ranked_rpc().returning(|_, _, _| {
            Err(StoreError::Status {
                status: 500,
                body: "boom".into(),
            })
        });
        store.expect_scan_rows().returning(|_, _| {
            Err(StoreError::Status {
                status: 500,
                body: "boom".into(),
            })
        });

        let fetcher = AggregateFetcher::new(Arc::new(store), 12, 500, Duration::ZERO);
        let block = fetcher.fetch_block(&Scope::Global).await;
        assert!(block.is_empty());
    }

    #[tokio::test]
    async fn test_minimum_elapsed_floor_is_enforced() {
        let mut store = MockContentStore::new();
        store.expect_ranked_rpc().returning(|_, _, _| Ok(vec![json!({ "id": "a" })]));

        let floor = Duration::from_millis(40);
        let fetcher = AggregateFetcher::new(Arc::new(store), 12, 500, floor);
        let start = Instant::now();
        let _ = fetcher.fetch_block(&Scope::Global).await;
        assert!(start.elapsed() >= floor);
    }
}
