use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::{Result, SupabaseClient};

/// Builder for a single table/view request.
///
/// Mirrors the small slice of the PostgREST filter grammar the platform
/// actually uses: `select`, `eq`, `not.is.null`, `or(...ilike...)`,
/// `order`, `limit` and `offset`.
pub struct TableQuery {
    client: SupabaseClient,
    table: String,
    params: Vec<(String, String)>,
    bearer: Option<String>,
}

impl TableQuery {
    pub(crate) fn new(client: SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            params: Vec::new(),
            bearer: None,
        }
    }

    /// Authorize the request with a caller's session token instead of
    /// the service key, so row-level security applies to the caller.
    pub fn as_user(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    /// Column list, including embedded aggregate selects such as
    /// `likes_count:likes!likes_post_id_fkey(count)`. Whitespace is
    /// stripped so callers can keep readable multi-line constants.
    pub fn select(mut self, columns: &str) -> Self {
        let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.params.push(("select".into(), compact));
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn neq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("neq.{}", value)));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.params.push((column.to_string(), "not.is.null".into()));
        self
    }

    /// Case-insensitive substring match across several columns,
    /// `or=(a.ilike.*term*,b.ilike.*term*)`.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        // `*` is the PostgREST wildcard; commas and parens would break
        // the or-expression grammar so they are dropped from the term.
        let sanitized: String = term
            .chars()
            .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
            .collect();
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("{}.ilike.*{}*", c, sanitized))
            .collect();
        self.params
            .push(("or".into(), format!("({})", clauses.join(","))));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.params
            .push(("order".into(), format!("{}.desc", column)));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.params.push(("limit".into(), n.to_string()));
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.params.push(("offset".into(), n.to_string()));
        self
    }

    /// Run the query, expecting a JSON array of rows.
    pub async fn fetch(self) -> Result<Vec<Value>> {
        let url = self.client.rest_url(&self.table);
        debug!(table = %self.table, params = ?self.params, "store fetch");
        let token = self.bearer.as_deref().unwrap_or(self.client.api_key());
        let resp = self
            .client
            .http()
            .get(&url)
            .header("apikey", self.client.api_key())
            .header("Authorization", format!("Bearer {}", token))
            .query(&self.params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }

    /// Run the query and take the first row, if any.
    pub async fn fetch_optional(self) -> Result<Option<Value>> {
        let rows = self.limit(1).fetch().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row, returning the stored representation.
    pub async fn insert(self, row: Value) -> Result<Vec<Value>> {
        self.write(reqwest::Method::POST, Some(row), &[("Prefer", "return=representation")])
            .await
    }

    /// Insert-or-update keyed on `on_conflict` columns.
    pub async fn upsert(mut self, row: Value, on_conflict: &str) -> Result<Vec<Value>> {
        self.params
            .push(("on_conflict".into(), on_conflict.to_string()));
        self.write(
            reqwest::Method::POST,
            Some(row),
            &[("Prefer", "resolution=merge-duplicates,return=representation")],
        )
        .await
    }

    /// Patch the rows matched by the accumulated filters.
    pub async fn update(self, patch: Value) -> Result<Vec<Value>> {
        self.write(
            reqwest::Method::PATCH,
            Some(patch),
            &[("Prefer", "return=representation")],
        )
        .await
    }

    /// Delete the rows matched by the accumulated filters.
    pub async fn delete(self) -> Result<Vec<Value>> {
        self.write(reqwest::Method::DELETE, None, &[("Prefer", "return=representation")])
            .await
    }

    async fn write(
        self,
        method: reqwest::Method,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        let url = self.client.rest_url(&self.table);
        debug!(table = %self.table, method = %method, "store write");
        let token = self.bearer.as_deref().unwrap_or(self.client.api_key());
        let mut req = self
            .client
            .http()
            .request(method, &url)
            .header("apikey", self.client.api_key())
            .header("Authorization", format!("Bearer {}", token))
            .query(&self.params);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> TableQuery {
        SupabaseClient::new("https://proj.supabase.co", "key").from("book_summaries")
    }

    #[test]
    fn test_select_strips_whitespace() {
        let q = query().select(
            "id,
             title,
             likes_count:likes!likes_post_id_fkey(count)",
        );
        assert_eq!(
            q.params[0],
            (
                "select".to_string(),
                "id,title,likes_count:likes!likes_post_id_fkey(count)".to_string()
            )
        );
    }

    #[test]
    fn test_filters_accumulate_in_order() {
        let q = query()
            .eq("category", "Finance")
            .not_null("category")
            .order_desc("created_at")
            .limit(6)
            .offset(20);
        let params: Vec<(&str, &str)> = q
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("category", "eq.Finance"),
                ("category", "not.is.null"),
                ("order", "created_at.desc"),
                ("limit", "6"),
                ("offset", "20"),
            ]
        );
    }

    #[test]
    fn test_ilike_any_builds_or_expression() {
        let q = query().ilike_any(&["title", "author", "summary"], "cooking");
        assert_eq!(
            q.params[0],
            (
                "or".to_string(),
                "(title.ilike.*cooking*,author.ilike.*cooking*,summary.ilike.*cooking*)"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_ilike_any_drops_grammar_characters() {
        let q = query().ilike_any(&["title"], "a,b(c)*d");
        assert_eq!(q.params[0].1, "(title.ilike.*abcd*)");
    }
}
