//! Top-level feed orchestration.
//!
//! The controller owns all feed state and sequences the staged loads:
//! fast placeholder first, heavy ranked block later, per-category
//! blocks in fixed-size batches as the sentinel reports the reader
//! approaching the end of the page.
//!
//! Mode switches and teardown bump a generation counter; every state
//! commit carries the generation it was started under and is discarded
//! if the controller has moved on, so late-resolving fetches from an
//! abandoned mode can never leak into the new one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::aggregate::AggregateFetcher;
use crate::cache::FastCache;
use crate::categories::fetch_top_categories;
use crate::models::{FeedMode, FeedParams, FeedSnapshot, Scope, ScopeBlock};
use crate::normalizer::normalize_rows;
use crate::placeholder::PlaceholderFetcher;
use crate::sentinel::VisibilityNotifier;
use crate::store::ContentStore;

/// Tunables for the staged feed. Defaults match the production UI.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Items per ranked carousel
    pub items_per_carousel: usize,
    /// Placeholder page size for the active scope
    pub placeholder_limit: usize,
    /// Placeholder page size for batched category blocks
    pub batch_placeholder_limit: usize,
    /// Categories materialized per batch
    pub category_batch: usize,
    /// Row cap for the client-side ranking fallback
    pub scan_cap: usize,
    /// Row cap for search results
    pub search_cap: usize,
    /// Rows scanned when ranking the category list
    pub category_scan_cap: usize,
    /// Maximum number of ranked categories kept in the queue
    pub category_list_cap: usize,
    /// Elapsed floor per heavy block fetch
    pub min_block_time: Duration,
    /// Elapsed floor for a whole mode transition
    pub min_transition_time: Duration,
    /// Sentinel lookahead margin
    pub sentinel_margin_px: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            items_per_carousel: 12,
            placeholder_limit: 6,
            batch_placeholder_limit: 4,
            category_batch: 3,
            scan_cap: 500,
            search_cap: 500,
            category_scan_cap: 2000,
            category_list_cap: 200,
            min_block_time: Duration::from_millis(50),
            min_transition_time: Duration::from_millis(350),
            sentinel_margin_px: 600,
        }
    }
}

/// Mutable feed state. Only touched through `FeedController::commit`.
struct FeedState {
    mode: FeedMode,
    loading_global: bool,
    global: ScopeBlock,
    blocks: Vec<ScopeBlock>,
    queue: Vec<String>,
    loading_categories: bool,
    has_more: bool,
    search_error: Option<String>,
}

impl FeedState {
    fn fresh(mode: FeedMode) -> Self {
        Self {
            mode,
            loading_global: true,
            global: ScopeBlock::empty(Scope::Global),
            blocks: Vec::new(),
            queue: Vec::new(),
            loading_categories: false,
            has_more: false,
            search_error: None,
        }
    }

    fn snapshot(&self, generation: u64) -> FeedSnapshot {
        FeedSnapshot {
            generation,
            mode: self.mode.clone(),
            loading_global: self.loading_global,
            global: self.global.clone(),
            category_blocks: self.blocks.clone(),
            queued_categories: self.queue.len(),
            loading_categories: self.loading_categories,
            has_more_categories: self.has_more,
            search_error: self.search_error.clone(),
        }
    }

    /// Replace a materialized block by scope match, appending when the
    /// block was never materialized. Established order is append-only.
    fn replace_block(&mut self, block: ScopeBlock) {
        match self.blocks.iter_mut().find(|b| b.scope == block.scope) {
            Some(slot) => *slot = block,
            None => self.blocks.push(block),
        }
    }
}

/// State-owning feed controller.
///
/// Cheap to clone; clones share state, cache and generation, so a
/// clone can be handed to background tasks and sentinel callbacks.
pub struct FeedController<S> {
    store: Arc<S>,
    config: Arc<FeedConfig>,
    placeholder: PlaceholderFetcher<S>,
    aggregate: AggregateFetcher<S>,
    state: Arc<Mutex<FeedState>>,
    generation: Arc<AtomicU64>,
    snapshot_tx: Arc<watch::Sender<FeedSnapshot>>,
    sentinel: Arc<Mutex<Option<Box<dyn VisibilityNotifier>>>>,
}

impl<S> Clone for FeedController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            placeholder: self.placeholder.clone(),
            aggregate: self.aggregate.clone(),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            sentinel: Arc::clone(&self.sentinel),
        }
    }
}

impl<S: ContentStore> FeedController<S> {
    pub fn new(store: Arc<S>, config: FeedConfig) -> Self {
        let cache = FastCache::new();
        let placeholder = PlaceholderFetcher::new(Arc::clone(&store), cache);
        let aggregate = AggregateFetcher::new(
            Arc::clone(&store),
            config.items_per_carousel,
            config.scan_cap,
            config.min_block_time,
        );
        let (snapshot_tx, _) = watch::channel(FeedSnapshot::initial());
        Self {
            store,
            config: Arc::new(config),
            placeholder,
            aggregate,
            state: Arc::new(Mutex::new(FeedState::fresh(FeedMode::Default))),
            generation: Arc::new(AtomicU64::new(0)),
            snapshot_tx: Arc::new(snapshot_tx),
            sentinel: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribe to state snapshots; a new one is published after every
    /// committed state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Switch to the mode selected by `params`, tearing down all state
    /// from the previous mode first. Returns once the fast path has
    /// rendered and the transition floor elapsed; heavy fetches keep
    /// running in the background.
    pub async fn activate(&self, params: FeedParams) {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mode = params.mode();
        debug!(?mode, generation = token, "feed activation");
        self.commit(token, {
            let mode = mode.clone();
            move |st| *st = FeedState::fresh(mode)
        })
        .await;

        match mode {
            FeedMode::Search(query) => self.run_search(token, query).await,
            FeedMode::Category(category) => self.run_category(token, category).await,
            FeedMode::Default => self.run_default(token).await,
        }
    }

    /// Drop everything: pending fetches become stale, the sentinel is
    /// disconnected and state is cleared.
    pub async fn teardown(&self) {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(mut notifier) = self.sentinel.lock().await.take() {
            notifier.disconnect();
        }
        self.commit(token, |st| *st = FeedState::fresh(FeedMode::Default))
            .await;
    }

    /// Wire a visibility notifier to batch loading, disconnecting any
    /// previously attached one. Repeated intersection events while a
    /// batch is in flight are absorbed by the loading guard.
    pub async fn attach_sentinel(&self, mut notifier: Box<dyn VisibilityNotifier>) {
        let mut slot = self.sentinel.lock().await;
        if let Some(mut previous) = slot.take() {
            previous.disconnect();
        }
        let this = self.clone();
        let handle = tokio::runtime::Handle::current();
        notifier.observe(
            self.config.sentinel_margin_px,
            Box::new(move || {
                let this = this.clone();
                handle.spawn(async move {
                    let ready = {
                        let st = this.state.lock().await;
                        st.has_more && !st.loading_categories
                    };
                    if ready {
                        this.load_next_batch().await;
                    }
                });
            }),
        );
        *slot = Some(notifier);
    }

    /// Materialize the next category batch: placeholders committed
    /// all-or-nothing, heavy replacements following in the background.
    pub async fn load_next_batch(&self) {
        let token = self.generation.load(Ordering::SeqCst);
        self.load_batch(token).await;
    }

    async fn run_search(&self, token: u64, query: String) {
        let start = Instant::now();
        let fast = self
            .placeholder
            .fetch(&Scope::Global, self.config.placeholder_limit)
            .await;
        self.commit(token, move |st| {
            st.global = ScopeBlock::placeholder(Scope::Global, fast)
        })
        .await;

        let rows = match self.store.search_rpc(&query, self.config.search_cap).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                debug!("search rpc failed, trying scan fallback: {}", e);
                match self
                    .store
                    .search_scan(&query, 0, self.config.search_cap)
                    .await
                {
                    Ok(rows) => Some(rows),
                    Err(e) => {
                        error!("search failed for {:?}: {}", query, e);
                        None
                    }
                }
            }
        };

        match rows {
            Some(rows) => {
                let items = normalize_rows(&rows);
                self.commit(token, move |st| {
                    // results replace the placeholder wholesale; only
                    // the newest list carries them in search mode
                    st.global = ScopeBlock {
                        scope: Scope::Global,
                        newest: items,
                        most_liked: Vec::new(),
                        highest_rated: Vec::new(),
                        most_viewed: Vec::new(),
                    };
                })
                .await;
            }
            None => {
                self.commit(token, |st| {
                    st.search_error = Some("Search failed.".to_string())
                })
                .await;
            }
        }

        self.finish_transition(token, start).await;
    }

    async fn run_category(&self, token: u64, category: String) {
        let start = Instant::now();
        let scope = Scope::Category(category);
        let items = self
            .placeholder
            .fetch(&scope, self.config.placeholder_limit)
            .await;
        self.commit(token, {
            let scope = scope.clone();
            move |st| st.blocks = vec![ScopeBlock::placeholder(scope, items)]
        })
        .await;

        let this = self.clone();
        tokio::spawn(async move {
            let block = this.aggregate.fetch_block(&scope).await;
            if block.is_empty() {
                // flaky heavy query; the visible placeholder stays
                debug!(scope = %scope.cache_key(), "heavy block empty, keeping placeholder");
                return;
            }
            this.commit(token, move |st| st.blocks = vec![block]).await;
        });

        self.finish_transition(token, start).await;
    }

    async fn run_default(&self, token: u64) {
        let start = Instant::now();
        let fast = self
            .placeholder
            .fetch(&Scope::Global, self.config.placeholder_limit)
            .await;
        self.commit(token, move |st| {
            st.global = ScopeBlock::placeholder(Scope::Global, fast)
        })
        .await;

        let this = self.clone();
        tokio::spawn(async move {
            let (heavy, categories) = tokio::join!(
                this.aggregate.fetch_block(&Scope::Global),
                fetch_top_categories(
                    &*this.store,
                    this.config.category_scan_cap,
                    this.config.category_list_cap
                ),
            );
            let seeded = !categories.is_empty();
            let committed = this
                .commit(token, move |st| {
                    if !heavy.is_empty() {
                        st.global = heavy;
                    }
                    st.queue = categories;
                    st.has_more = !st.queue.is_empty();
                })
                .await;
            if committed && seeded {
                this.load_batch(token).await;
            }
        });

        self.finish_transition(token, start).await;
    }

    async fn load_batch(&self, token: u64) {
        let batch: Vec<String> = {
            let mut st = self.state.lock().await;
            if self.generation.load(Ordering::SeqCst) != token {
                return;
            }
            if st.loading_categories {
                return;
            }
            if st.queue.is_empty() {
                st.has_more = false;
                let snap = st.snapshot(token);
                drop(st);
                let _ = self.snapshot_tx.send(snap);
                return;
            }
            st.loading_categories = true;
            let n = self.config.category_batch.min(st.queue.len());
            let batch: Vec<String> = st.queue.drain(..n).collect();
            st.has_more = !st.queue.is_empty();
            let snap = st.snapshot(token);
            let _ = self.snapshot_tx.send(snap);
            batch
        };

        // fast placeholders for the whole batch; one commit so a batch
        // becomes visible all at once or not at all
        let placeholders = futures::future::join_all(batch.iter().map(|name| {
            let fetcher = self.placeholder.clone();
            let scope = Scope::Category(name.clone());
            let limit = self.config.batch_placeholder_limit;
            async move {
                let items = fetcher.fetch(&scope, limit).await;
                ScopeBlock::placeholder(scope, items)
            }
        }))
        .await;
        self.commit(token, move |st| st.blocks.extend(placeholders))
            .await;

        // heavy replacement runs independently of the caller and of any
        // later batch's fast fetches
        let this = self.clone();
        tokio::spawn(async move {
            let blocks = futures::future::join_all(batch.iter().map(|name| {
                let aggregate = this.aggregate.clone();
                let scope = Scope::Category(name.clone());
                async move { aggregate.fetch_block(&scope).await }
            }))
            .await;
            this.commit(token, move |st| {
                for block in blocks.into_iter().filter(|b| !b.is_empty()) {
                    st.replace_block(block);
                }
            })
            .await;
        });

        self.commit(token, |st| st.loading_categories = false).await;
    }

    async fn finish_transition(&self, token: u64, start: Instant) {
        let elapsed = start.elapsed();
        if elapsed < self.config.min_transition_time {
            tokio::time::sleep(self.config.min_transition_time - elapsed).await;
        }
        self.commit(token, |st| st.loading_global = false).await;
    }

    /// Apply a state change if the controller is still on `token`'s
    /// generation, then publish a snapshot. Returns whether the change
    /// was applied.
    async fn commit<F>(&self, token: u64, apply: F) -> bool
    where
        F: FnOnce(&mut FeedState) + Send,
    {
        if self.generation.load(Ordering::SeqCst) != token {
            debug!(generation = token, "discarding stale commit");
            return false;
        }
        let mut st = self.state.lock().await;
        // re-check under the lock; activation resets state holding it
        if self.generation.load(Ordering::SeqCst) != token {
            debug!(generation = token, "discarding stale commit");
            return false;
        }
        apply(&mut st);
        let snap = st.snapshot(token);
        drop(st);
        let _ = self.snapshot_tx.send(snap);
        true
    }
}
