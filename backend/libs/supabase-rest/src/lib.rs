//! Minimal PostgREST-style client for the hosted database service.
//!
//! The platform keeps no database of its own: rows, aggregates and the
//! named remote procedures all live behind the provider's REST surface.
//! This crate wraps that surface with a small query builder (`from`),
//! an RPC entry point (`rpc`) and a session lookup against the
//! provider's auth endpoint (`auth_user`).

pub mod auth;
pub mod error;
pub mod query;

pub use auth::AuthUser;
pub use error::StoreError;
pub use query::TableQuery;

use serde_json::Value;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Client for one project of the hosted database service.
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Create a client for `base_url` (project root, no trailing slash)
    /// authenticated with the project's anon/service key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Start a query against a table or view.
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery::new(self.clone(), table)
    }

    /// Call a named remote procedure with a JSON argument object.
    ///
    /// A procedure that is not deployed surfaces as a `Status` error
    /// (404/400 from the REST layer); callers treat that as a signal to
    /// take their client-side fallback path.
    pub async fn rpc(&self, name: &str, args: Value) -> Result<Value> {
        self.rpc_as(name, args, None).await
    }

    /// Call a remote procedure with a caller's session token, so
    /// row-level security applies to the caller rather than the
    /// service key.
    pub async fn rpc_as(&self, name: &str, args: Value, bearer: Option<&str>) -> Result<Value> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, name);
        let token = bearer.unwrap_or(&self.api_key);
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", token))
            .json(&args)
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
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let client = SupabaseClient::new("https://proj.supabase.co/", "key");
        assert_eq!(
            client.rest_url("book_summaries"),
            "https://proj.supabase.co/rest/v1/book_summaries"
        );
        assert_eq!(client.auth_url(), "https://proj.supabase.co/auth/v1/user");
    }
}
