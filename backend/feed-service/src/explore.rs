//! Flat offset-paged browsing, the "see everything" counterpart to the
//! carousel feed. One page per call; the caller appends pages and keeps
//! the offset.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::models::ContentItem;
use crate::normalizer::normalize_rows;
use crate::store::ContentStore;

pub const EXPLORE_PAGE_SIZE: usize = 20;

/// How a browse page is ordered. Parsed from a query-string value;
/// anything unrecognized is newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExploreSort {
    #[default]
    Newest,
    Likes,
    Views,
    Rating,
}

impl ExploreSort {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "likes" => ExploreSort::Likes,
            "views" => ExploreSort::Views,
            "rating" => ExploreSort::Rating,
            _ => ExploreSort::Newest,
        }
    }

    fn sort(&self, items: &mut [ContentItem]) {
        match self {
            ExploreSort::Newest => items.sort_by(|a, b| b.recency().cmp(&a.recency())),
            ExploreSort::Likes => items.sort_by(|a, b| b.likes_count.cmp(&a.likes_count)),
            ExploreSort::Views => items.sort_by(|a, b| b.views_count.cmp(&a.views_count)),
            ExploreSort::Rating => items.sort_by(|a, b| {
                b.avg_rating
                    .partial_cmp(&a.avg_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }
}

/// What a browse page was asked for.
#[derive(Debug, Clone, Default)]
pub struct ExploreQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: ExploreSort,
    pub offset: usize,
}

/// One resolved page.
#[derive(Debug, Clone, Serialize)]
pub struct ExplorePage {
    pub items: Vec<ContentItem>,
    /// Offset to request the next page at
    pub next_offset: usize,
    pub has_more: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    /// Both the search procedure and the substring fallback failed.
    #[error("Search failed.")]
    SearchFailed,
    /// The browse listing itself failed.
    #[error("Unable to load content.")]
    Unavailable,
}

pub struct ExploreFetcher<S> {
    store: std::sync::Arc<S>,
    /// Rows pulled from the search procedure before client-side paging
    search_cap: usize,
}

impl<S: ContentStore> ExploreFetcher<S> {
    pub fn new(store: std::sync::Arc<S>, search_cap: usize) -> Self {
        Self { store, search_cap }
    }

    pub async fn fetch(&self, query: &ExploreQuery) -> Result<ExplorePage, ExploreError> {
        match query.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => self.search_page(term, query).await,
            _ => self.browse_page(query).await,
        }
    }

    /// Search pulls a capped result set once and pages it client-side;
    /// when the procedure is unavailable the substring scan pages
    /// server-side instead.
    async fn search_page(
        &self,
        term: &str,
        query: &ExploreQuery,
    ) -> Result<ExplorePage, ExploreError> {
        match self.store.search_rpc(term, self.search_cap).await {
            Ok(rows) => Ok(self.slice_sorted(rows, query)),
            Err(e) => {
                debug!("search rpc failed, trying scan fallback: {}", e);
                match self
                    .store
                    .search_scan(term, query.offset, EXPLORE_PAGE_SIZE)
                    .await
                {
                    Ok(rows) => Ok(self.page_of(rows, query)),
                    Err(e) => {
                        error!("explore search failed for {:?}: {}", term, e);
                        Err(ExploreError::SearchFailed)
                    }
                }
            }
        }
    }

    async fn browse_page(&self, query: &ExploreQuery) -> Result<ExplorePage, ExploreError> {
        let rows = self
            .store
            .page_rows(query.category.as_deref(), query.offset, EXPLORE_PAGE_SIZE)
            .await
            .map_err(|e| {
                error!("explore browse failed: {}", e);
                ExploreError::Unavailable
            })?;
        Ok(self.page_of(rows, query))
    }

    /// Sort the full result set, then slice out the requested page.
    fn slice_sorted(&self, rows: Vec<Value>, query: &ExploreQuery) -> ExplorePage {
        let mut items = normalize_rows(&rows);
        query.sort.sort(&mut items);
        let total = items.len();
        let page: Vec<ContentItem> = items
            .into_iter()
            .skip(query.offset)
            .take(EXPLORE_PAGE_SIZE)
            .collect();
        let next_offset = query.offset + page.len();
        ExplorePage {
            items: page,
            next_offset,
            has_more: next_offset < total,
        }
    }

    /// A server-paged set: sort within the page only; a full page means
    /// there is probably more.
    fn page_of(&self, rows: Vec<Value>, query: &ExploreQuery) -> ExplorePage {
        let fetched = rows.len();
        let mut items = normalize_rows(&rows);
        query.sort.sort(&mut items);
        ExplorePage {
            items,
            next_offset: query.offset + fetched,
            has_more: fetched == EXPLORE_PAGE_SIZE,
        }
    }
}
