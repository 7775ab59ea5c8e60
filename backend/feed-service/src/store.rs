//! The consumed backend query interface.
//!
//! Everything the feed needs from the hosted database service sits
//! behind [`ContentStore`] so the orchestrator can be exercised against
//! a scripted store in tests and against PostgREST in production.

pub mod supabase;

use async_trait::async_trait;
use serde_json::Value;
use supabase_rest::StoreError;

use crate::models::ContentItem;

pub use supabase::SupabaseStore;

/// Cheap column list for placeholder queries.
pub const LIGHT_COLUMNS: &str = "
    id,
    created_at,
    title,
    author,
    summary,
    category,
    user_id,
    image_url,
    affiliate_link,
    avg_rating,
    slug
";

/// Column list with the derived aggregate counts joined in.
pub const COUNTED_COLUMNS: &str = "
    id,
    created_at,
    title,
    author,
    summary,
    category,
    user_id,
    image_url,
    affiliate_link,
    likes_count:likes!likes_post_id_fkey(count),
    views_count:views!views_post_id_fkey(count),
    comments_count:comments!comments_post_id_fkey(count),
    slug
";

/// The four ranked lists of a scope block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    Newest,
    MostLiked,
    HighestRated,
    MostViewed,
}

impl Ranking {
    pub const ALL: [Ranking; 4] = [
        Ranking::Newest,
        Ranking::MostLiked,
        Ranking::HighestRated,
        Ranking::MostViewed,
    ];

    /// Name of the server-side ranked procedure.
    pub fn rpc_name(&self) -> &'static str {
        match self {
            Ranking::Newest => "get_newest",
            Ranking::MostLiked => "get_top_liked",
            Ranking::HighestRated => "get_highest_rated",
            Ranking::MostViewed => "get_top_viewed",
        }
    }

    /// Client-side sort with the same semantics as the procedure.
    pub fn sort(&self, items: &mut [ContentItem]) {
        match self {
            Ranking::Newest => items.sort_by(|a, b| b.recency().cmp(&a.recency())),
            Ranking::MostLiked => items.sort_by(|a, b| b.likes_count.cmp(&a.likes_count)),
            Ranking::HighestRated => items.sort_by(|a, b| {
                b.avg_rating
                    .partial_cmp(&a.avg_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            Ranking::MostViewed => items.sort_by(|a, b| b.views_count.cmp(&a.views_count)),
        }
    }
}

/// Row-oriented queries against the content table and its aggregates.
///
/// Implementations return raw rows; normalization happens in exactly
/// one place (`normalizer`) regardless of which path produced the rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Small recency-ordered page, optionally filtered by category.
    async fn recent_rows<'a>(
        &self,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Server-side ranked query. Errors (including "procedure not
    /// deployed") are expected; callers fall back to `scan_rows`.
    async fn ranked_rpc<'a>(
        &self,
        ranking: Ranking,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Bounded bulk fetch for client-side ranking fallback.
    async fn scan_rows<'a>(
        &self,
        category: Option<&'a str>,
        cap: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Server-side prefix/full-text search.
    async fn search_rpc(&self, query: &str, cap: usize) -> Result<Vec<Value>, StoreError>;

    /// Substring-match fallback across title/author/summary.
    async fn search_scan(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Offset-paged browse listing, optionally filtered by category.
    async fn page_rows<'a>(
        &self,
        category: Option<&'a str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Capped dump of the category column for frequency ranking.
    async fn category_rows(&self, cap: usize) -> Result<Vec<Value>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_row;
    use serde_json::json;

    fn item(id: &str, created_at: &str, likes: u64, rating: f64, views: u64) -> ContentItem {
        normalize_row(&json!({
            "id": id,
            "created_at": created_at,
            "likes_count": likes,
            "avg_rating": rating,
            "views_count": views,
        }))
    }

    #[test]
    fn test_ranking_sorts_match_rpc_semantics() {
        let a = item("a", "2024-01-01T00:00:00Z", 5, 2.0, 100);
        let b = item("b", "2024-03-01T00:00:00Z", 1, 4.5, 10);
        let c = item("c", "2024-02-01T00:00:00Z", 9, 3.0, 50);

        let mut items = vec![a.clone(), b.clone(), c.clone()];
        Ranking::Newest.sort(&mut items);
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["b", "c", "a"]);

        let mut items = vec![a.clone(), b.clone(), c.clone()];
        Ranking::MostLiked.sort(&mut items);
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["c", "a", "b"]);

        let mut items = vec![a.clone(), b.clone(), c.clone()];
        Ranking::HighestRated.sort(&mut items);
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["b", "c", "a"]);

        let mut items = vec![a, b, c];
        Ranking::MostViewed.sort(&mut items);
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["a", "c", "b"]);
    }

    #[test]
    fn test_missing_created_at_sorts_oldest() {
        let dated = item("dated", "2024-01-01T00:00:00Z", 0, 0.0, 0);
        let undated = normalize_row(&json!({ "id": "undated" }));
        let mut items = vec![undated, dated];
        Ranking::Newest.sort(&mut items);
        assert_eq!(items[0].id, "dated");
        assert_eq!(items[1].id, "undated");
    }
}
