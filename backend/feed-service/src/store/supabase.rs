//! PostgREST binding of the content store.

use async_trait::async_trait;
use serde_json::{json, Value};
use supabase_rest::{StoreError, SupabaseClient};

use super::{ContentStore, Ranking, COUNTED_COLUMNS, LIGHT_COLUMNS};

const CONTENT_TABLE: &str = "book_summaries";
const SEARCH_RPC: &str = "book_summaries_search_prefix";

/// Content store backed by the hosted database service.
#[derive(Clone)]
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Procedures return either a bare row array or a `{ data: [...] }`
    /// envelope depending on how they are defined; accept both.
    fn rows_from_rpc(payload: Value) -> Vec<Value> {
        match payload {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl ContentStore for SupabaseStore {
    async fn recent_rows<'a>(
        &self,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let mut q = self
            .client
            .from(CONTENT_TABLE)
            .select(LIGHT_COLUMNS)
            .order_desc("created_at")
            .limit(limit);
        if let Some(category) = category {
            q = q.eq("category", category);
        }
        q.fetch().await
    }

    async fn ranked_rpc<'a>(
        &self,
        ranking: Ranking,
        category: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let mut args = json!({ "p_limit": limit });
        if let Some(category) = category {
            args["p_category"] = json!(category);
        }
        let payload = self.client.rpc(ranking.rpc_name(), args).await?;
        Ok(Self::rows_from_rpc(payload))
    }

    async fn scan_rows<'a>(
        &self,
        category: Option<&'a str>,
        cap: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let mut q = self
            .client
            .from(CONTENT_TABLE)
            .select(COUNTED_COLUMNS)
            .limit(cap);
        if let Some(category) = category {
            q = q.eq("category", category);
        }
        q.fetch().await
    }

    async fn search_rpc(&self, query: &str, cap: usize) -> Result<Vec<Value>, StoreError> {
        let payload = self
            .client
            .rpc(SEARCH_RPC, json!({ "q": query, "lim": cap }))
            .await?;
        Ok(Self::rows_from_rpc(payload))
    }

    async fn search_scan(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        self.client
            .from(CONTENT_TABLE)
            .select(COUNTED_COLUMNS)
            .ilike_any(&["title", "author", "summary"], query)
            .offset(offset)
            .limit(limit)
            .fetch()
            .await
    }

    async fn page_rows<'a>(
        &self,
        category: Option<&'a str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let mut q = self
            .client
            .from(CONTENT_TABLE)
            .select(COUNTED_COLUMNS)
            .offset(offset)
            .limit(limit);
        if let Some(category) = category {
            q = q.eq("category", category);
        }
        q.fetch().await
    }

    async fn category_rows(&self, cap: usize) -> Result<Vec<Value>, StoreError> {
        self.client
            .from(CONTENT_TABLE)
            .select("category")
            .not_null("category")
            .limit(cap)
            .fetch()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_from_rpc_accepts_both_payload_shapes() {
        let bare = json!([{ "id": "a" }, { "id": "b" }]);
        assert_eq!(SupabaseStore::rows_from_rpc(bare).len(), 2);

        let enveloped = json!({ "data": [{ "id": "a" }] });
        assert_eq!(SupabaseStore::rows_from_rpc(enveloped).len(), 1);

        assert!(SupabaseStore::rows_from_rpc(Value::Null).is_empty());
        assert!(SupabaseStore::rows_from_rpc(json!({ "error": "boom" })).is_empty());
    }
}
