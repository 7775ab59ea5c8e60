//! Stateless feed projections for the web client.
//!
//! The embeddable `FeedController` drives stateful hosts; these
//! endpoints expose the same staged primitives as one-shot queries so
//! a plain web client can assemble the page itself.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use feed_service::aggregate::AggregateFetcher;
use feed_service::cache::FastCache;
use feed_service::categories::fetch_top_categories;
use feed_service::explore::{ExploreError, ExploreFetcher, ExploreQuery, ExploreSort};
use feed_service::placeholder::PlaceholderFetcher;
use feed_service::store::SupabaseStore;
use feed_service::{FeedConfig, Scope};

/// Shared fetchers for the feed endpoints. One per process; the
/// placeholder cache lives for the lifetime of the service.
pub struct FeedHandlerState {
    store: Arc<SupabaseStore>,
    placeholder: PlaceholderFetcher<SupabaseStore>,
    aggregate: AggregateFetcher<SupabaseStore>,
    explore: ExploreFetcher<SupabaseStore>,
    config: FeedConfig,
}

impl FeedHandlerState {
    pub fn new(store: Arc<SupabaseStore>) -> Self {
        let config = FeedConfig::default();
        let placeholder = PlaceholderFetcher::new(Arc::clone(&store), FastCache::new());
        // elapsed floors are a rendering concern; the HTTP projections
        // answer as fast as they can
        let aggregate = AggregateFetcher::new(
            Arc::clone(&store),
            config.items_per_carousel,
            config.scan_cap,
            Duration::ZERO,
        );
        let explore = ExploreFetcher::new(Arc::clone(&store), config.search_cap);
        Self {
            store,
            placeholder,
            aggregate,
            explore,
            config,
        }
    }
}

#[derive(Deserialize)]
pub struct ScopeParams {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct ExploreParams {
    pub category: Option<String>,
    #[serde(alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub offset: usize,
}

fn scope_of(category: Option<&str>) -> Scope {
    match category.map(str::trim) {
        Some(name) if !name.is_empty() => Scope::Category(name.to_string()),
        _ => Scope::Global,
    }
}

/// Fast path: a small cached recency page for the requested scope.
pub async fn get_placeholder(
    state: web::Data<FeedHandlerState>,
    query: web::Query<ScopeParams>,
) -> Result<HttpResponse> {
    let scope = scope_of(query.category.as_deref());
    let items = state
        .placeholder
        .fetch(&scope, state.config.placeholder_limit)
        .await;
    Ok(HttpResponse::Ok().json(items))
}

/// Heavy path for the default feed: the global ranked block plus the
/// frequency-ranked category names the client will page through.
pub async fn get_home(state: web::Data<FeedHandlerState>) -> Result<HttpResponse> {
    let (global, categories) = tokio::join!(
        state.aggregate.fetch_block(&Scope::Global),
        fetch_top_categories(
            &*state.store,
            state.config.category_scan_cap,
            state.config.category_list_cap
        ),
    );
    Ok(HttpResponse::Ok().json(json!({
        "global": global,
        "categories": categories,
    })))
}

/// Heavy path for one category block.
pub async fn get_block(
    state: web::Data<FeedHandlerState>,
    query: web::Query<ScopeParams>,
) -> Result<HttpResponse> {
    let scope = match scope_of(query.category.as_deref()) {
        Scope::Global => {
            return Err(AppError::BadRequest("category is required".to_string()));
        }
        scope => scope,
    };
    let block = state.aggregate.fetch_block(&scope).await;
    Ok(HttpResponse::Ok().json(block))
}

/// Offset-paged browse/search listing.
pub async fn explore(
    state: web::Data<FeedHandlerState>,
    query: web::Query<ExploreParams>,
) -> Result<HttpResponse> {
    let explore_query = ExploreQuery {
        category: query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from),
        search: query.q.clone(),
        sort: ExploreSort::parse(&query.sort),
        offset: query.offset,
    };
    let page = state
        .explore
        .fetch(&explore_query)
        .await
        .map_err(|e| match e {
            ExploreError::SearchFailed => AppError::Upstream("Search failed.".to_string()),
            ExploreError::Unavailable => {
                AppError::Upstream("Unable to load content.".to_string())
            }
        })?;
    Ok(HttpResponse::Ok().json(page))
}
