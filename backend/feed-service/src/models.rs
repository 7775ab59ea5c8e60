use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel category values that mean "show everything".
pub const FOR_YOU: &str = "For You";
pub const ALL: &str = "All";

/// Canonical normalized content record.
///
/// Fully defined by its source row at fetch time; the feed never
/// mutates one, it only fetches, normalizes and replaces whole items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub slug: Option<String>,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub category: String,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub likes_count: u64,
    pub views_count: u64,
    pub comments_count: u64,
    pub rating_count: u64,
    pub avg_rating: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// Slug preferred over id for addressing when present.
    pub fn address(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }

    /// Recency key; missing timestamps sort as oldest.
    pub fn recency(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A fetch scope: the whole table or a single category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Category(String),
}

impl Scope {
    pub fn category(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Category(name) => Some(name),
        }
    }

    /// Placeholder cache key, `global` or `cat:<name>`.
    pub fn cache_key(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Category(name) => format!("cat:{}", name),
        }
    }
}

/// One rendered block: the four ranked lists for a scope.
///
/// Created as a placeholder (all four lists equal) and later replaced
/// wholesale by a heavy-fetched block, never merged field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeBlock {
    pub scope: Scope,
    pub newest: Vec<ContentItem>,
    pub most_liked: Vec<ContentItem>,
    pub highest_rated: Vec<ContentItem>,
    pub most_viewed: Vec<ContentItem>,
}

impl ScopeBlock {
    pub fn empty(scope: Scope) -> Self {
        Self {
            scope,
            newest: Vec::new(),
            most_liked: Vec::new(),
            highest_rated: Vec::new(),
            most_viewed: Vec::new(),
        }
    }

    /// Optimistic block where every list is the same fast-fetched page.
    pub fn placeholder(scope: Scope, items: Vec<ContentItem>) -> Self {
        Self {
            scope,
            newest: items.clone(),
            most_liked: items.clone(),
            highest_rated: items.clone(),
            most_viewed: items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.newest.is_empty()
            && self.most_liked.is_empty()
            && self.highest_rated.is_empty()
            && self.most_viewed.is_empty()
    }
}

/// Caller-supplied feed parameters; `(category, search)` select a mode.
#[derive(Debug, Clone, Default)]
pub struct FeedParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl FeedParams {
    pub fn mode(&self) -> FeedMode {
        if let Some(q) = self.search.as_deref() {
            let q = q.trim();
            if !q.is_empty() {
                return FeedMode::Search(q.to_string());
            }
        }
        if let Some(cat) = self.category.as_deref() {
            let cat = cat.trim();
            if !cat.is_empty() && cat != FOR_YOU && cat != ALL {
                return FeedMode::Category(cat.to_string());
            }
        }
        FeedMode::Default
    }
}

/// Mutually exclusive orchestration modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedMode {
    /// Full-text/prefix search across all scopes
    Search(String),
    /// One category's block only
    Category(String),
    /// Global block plus progressively loaded category blocks
    Default,
}

/// Read-only view of the orchestrator state, published on every commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub generation: u64,
    pub mode: FeedMode,
    pub loading_global: bool,
    pub global: ScopeBlock,
    pub category_blocks: Vec<ScopeBlock>,
    pub queued_categories: usize,
    pub loading_categories: bool,
    pub has_more_categories: bool,
    /// Set only when the search chain failed end to end; the one fetch
    /// failure that warrants a user-visible message.
    pub search_error: Option<String>,
}

impl FeedSnapshot {
    pub fn initial() -> Self {
        Self {
            generation: 0,
            mode: FeedMode::Default,
            loading_global: true,
            global: ScopeBlock::empty(Scope::Global),
            category_blocks: Vec::new(),
            queued_categories: 0,
            loading_categories: false,
            has_more_categories: false,
            search_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(category: Option<&str>, search: Option<&str>) -> FeedParams {
        FeedParams {
            category: category.map(String::from),
            search: search.map(String::from),
        }
    }

    #[test]
    fn test_mode_selection_prefers_search() {
        assert_eq!(
            params(Some("Finance"), Some("cooking")).mode(),
            FeedMode::Search("cooking".into())
        );
    }

    #[test]
    fn test_mode_selection_blank_search_is_ignored() {
        assert_eq!(params(Some("Finance"), Some("   ")).mode(), FeedMode::Category("Finance".into()));
    }

    #[test]
    fn test_mode_selection_sentinel_categories_mean_default() {
        assert_eq!(params(Some(FOR_YOU), None).mode(), FeedMode::Default);
        assert_eq!(params(Some(ALL), None).mode(), FeedMode::Default);
        assert_eq!(params(None, None).mode(), FeedMode::Default);
    }

    #[test]
    fn test_scope_cache_keys() {
        assert_eq!(Scope::Global.cache_key(), "global");
        assert_eq!(Scope::Category("Self Help".into()).cache_key(), "cat:Self Help");
    }

    #[test]
    fn test_placeholder_block_repeats_the_same_list() {
        let block = ScopeBlock::placeholder(Scope::Global, Vec::new());
        assert!(block.is_empty());
        let item = ContentItem {
            id: "1".into(),
            slug: None,
            title: "t".into(),
            author: "a".into(),
            summary: String::new(),
            category: String::new(),
            image_url: None,
            affiliate_link: None,
            likes_count: 0,
            views_count: 0,
            comments_count: 0,
            rating_count: 0,
            avg_rating: 0.0,
            created_at: None,
        };
        let block = ScopeBlock::placeholder(Scope::Global, vec![item]);
        assert_eq!(block.newest, block.most_liked);
        assert_eq!(block.newest, block.most_viewed);
        assert!(!block.is_empty());
    }
}
