//! Shared harness for orchestrator integration tests: a scripted
//! in-memory store and a hand-driven visibility notifier.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feed_service::sentinel::VisibilityNotifier;
use feed_service::store::{ContentStore, Ranking};
use supabase_rest::StoreError;

pub fn summary(id: &str, category: &str, day: u32, likes: u64, rating: f64, views: u64) -> Value {
    json!({
        "id": id,
        "title": format!("{id} title"),
        "author": "Test Author",
        "summary": format!("summary of {id}"),
        "category": category,
        "created_at": format!("2024-03-{day:02}T00:00:00Z"),
        "likes_count": likes,
        "avg_rating": rating,
        "views_count": views,
    })
}

fn scripted_failure() -> StoreError {
    StoreError::Status {
        status: 500,
        body: "scripted failure".into(),
    }
}

fn procedure_missing() -> StoreError {
    StoreError::Status {
        status: 404,
        body: "function not found".into(),
    }
}

/// In-memory [`ContentStore`] with per-path kill switches and an
/// optional delay on the heavy paths, so tests can order the staged
/// loads deterministically.
pub struct ScriptedStore {
    catalog: Vec<Value>,
    pub ranked_rpc_enabled: AtomicBool,
    pub scan_enabled: AtomicBool,
    pub search_rpc_enabled: AtomicBool,
    pub search_scan_enabled: AtomicBool,
    heavy_delay: Duration,
    pub ranked_rpc_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(catalog: Vec<Value>) -> Self {
        Self {
            catalog,
            ranked_rpc_enabled: AtomicBool::new(true),
            scan_enabled: AtomicBool::new(true),
            search_rpc_enabled: AtomicBool::new(true),
            search_scan_enabled: AtomicBool::new(true),
            heavy_delay: Duration::ZERO,
            ranked_rpc_calls: AtomicUsize::new(0),
            recent_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_heavy_delay(mut self, delay: Duration) -> Self {
        self.heavy_delay = delay;
        self
    }

    pub fn without_heavy_paths(self) -> Self {
        self.ranked_rpc_enabled.store(false, Ordering::SeqCst);
        self.scan_enabled.store(false, Ordering::SeqCst);
        self
    }

    fn in_category(&self, category: Option<&str>) -> Vec<Value> {
        self.catalog
            .iter()
            .filter(|row| match category {
                Some(wanted) => row.get("category").and_then(Value::as_str) == Some(wanted),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn matching(&self, query: &str) -> Vec<Value> {
        let needle = query.to_ascii_lowercase();
        self.catalog
            .iter()
            .filter(|row| {
                ["title", "author", "summary"].iter().any(|col| {
                    row.get(*col)
                        .and_then(Value::as_str)
                        .map(|v| v.to_ascii_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn recent_rows<'a>(
        &self,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.in_category(category);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ranked_rpc<'a>(
        &self,
        _ranking: Ranking,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        self.ranked_rpc_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.heavy_delay).await;
        if !self.ranked_rpc_enabled.load(Ordering::SeqCst) {
            return Err(procedure_missing());
        }
        // ids get a marker so tests can tell heavy rows from the
        // placeholder's plain rows
        let mut rows = self.in_category(category);
        rows.truncate(limit);
        for row in rows.iter_mut() {
            if let Some(id) = row.get("id").and_then(Value::as_str).map(str::to_owned) {
                row["id"] = json!(format!("{id}-ranked"));
            }
        }
        Ok(rows)
    }

    async fn scan_rows<'a>(
        &self,
        category: Option<&'a str>,
        cap: usize,
    ) -> Result<Vec<Value>, StoreError> {
        tokio::time::sleep(self.heavy_delay).await;
        if !self.scan_enabled.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        let mut rows = self.in_category(category);
        rows.truncate(cap);
        Ok(rows)
    }

    async fn search_rpc(&self, query: &str, cap: usize) -> Result<Vec<Value>, StoreError> {
        if !self.search_rpc_enabled.load(Ordering::SeqCst) {
            return Err(procedure_missing());
        }
        let mut rows = self.matching(query);
        rows.truncate(cap);
        Ok(rows)
    }

    async fn search_scan(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        if !self.search_scan_enabled.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        Ok(self
            .matching(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn page_rows<'a>(
        &self,
        category: Option<&'a str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .in_category(category)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn category_rows(&self, cap: usize) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .catalog
            .iter()
            .take(cap)
            .map(|row| json!({ "category": row.get("category").cloned().unwrap_or(Value::Null) }))
            .collect())
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Visibility notifier driven by the test instead of a viewport.
#[derive(Clone, Default)]
pub struct ManualNotifier {
    callback: Arc<Mutex<Option<Callback>>>,
}

impl ManualNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intersect(&self) {
        let cb = self.callback.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }
}

impl VisibilityNotifier for ManualNotifier {
    fn observe(&mut self, _proximity_margin_px: u32, on_visible: Box<dyn Fn() + Send + Sync>) {
        *self.callback.lock().unwrap() = Some(Arc::from(on_visible));
    }

    fn disconnect(&mut self) {
        *self.callback.lock().unwrap() = None;
    }
}
