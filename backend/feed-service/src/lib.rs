//! Feed Service Library
//!
//! Staged content-feed orchestration for the summary platform: paint a
//! cheap recency placeholder first, then replace it in place with the
//! four ranked lists once the heavy queries settle, and progressively
//! materialize per-category blocks as the reader scrolls.
//!
//! # Modules
//!
//! - `models`: canonical content item, scope blocks, feed snapshots
//! - `normalizer`: defensive coercion of raw store rows
//! - `store`: the consumed query interface and its PostgREST binding
//! - `cache`: session-scoped placeholder cache
//! - `placeholder`: fast path (one cheap recency query per scope)
//! - `aggregate`: heavy path (four ranked queries with scan fallback)
//! - `categories`: frequency-ranked category listing
//! - `controller`: mode selection, sequencing, and batch loading
//! - `sentinel`: viewport visibility capability for infinite scroll
//! - `explore`: offset-paged browse/search listing
pub mod aggregate;
pub mod cache;
pub mod categories;
pub mod controller;
pub mod explore;
pub mod models;
pub mod normalizer;
pub mod placeholder;
pub mod sentinel;
pub mod store;

pub use cache::FastCache;
pub use controller::{FeedConfig, FeedController};
pub use models::{ContentItem, FeedMode, FeedParams, FeedSnapshot, Scope, ScopeBlock};
pub use store::{ContentStore, Ranking};
