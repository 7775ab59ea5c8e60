//! Engagement writes: likes, ratings, comments, view counting.
//!
//! Every mutation is authorized with the caller's own session token so
//! the store's row policies decide what the caller may touch; the
//! service never writes on a caller's behalf with its own key.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use supabase_rest::SupabaseClient;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Comment;

const RATE_RPC: &str = "rate_post";
const VIEWS_RPC: &str = "increment_views";

pub struct EngagementRepo {
    client: SupabaseClient,
}

impl EngagementRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn has_liked(&self, post_id: &str, user_id: Uuid) -> Result<bool> {
        let row = self
            .client
            .from("likes")
            .select("id")
            .eq("post_id", post_id)
            .eq("user_id", &user_id.to_string())
            .fetch_optional()
            .await?;
        Ok(row.is_some())
    }

    pub async fn like(&self, token: &str, post_id: &str, user_id: Uuid) -> Result<()> {
        self.client
            .from("likes")
            .as_user(token)
            .insert(json!({ "post_id": post_id, "user_id": user_id }))
            .await?;
        Ok(())
    }

    pub async fn unlike(&self, token: &str, post_id: &str, user_id: Uuid) -> Result<()> {
        self.client
            .from("likes")
            .as_user(token)
            .eq("post_id", post_id)
            .eq("user_id", &user_id.to_string())
            .delete()
            .await?;
        Ok(())
    }

    /// Store a 1-5 rating. The `rate_post` procedure owns the upsert
    /// semantics server-side; when it is not deployed the ratings table
    /// is upserted directly with the same keying.
    pub async fn rate(&self, token: &str, post_id: &str, user_id: Uuid, rating: u8) -> Result<()> {
        let args = json!({
            "p_post_id": post_id,
            "p_user_id": user_id,
            "p_rating": rating,
        });
        match self.client.rpc_as(RATE_RPC, args, Some(token)).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_unavailable() => {
                debug!(post_id, "rate_post rpc unavailable, upserting ratings table");
                self.client
                    .from("ratings")
                    .as_user(token)
                    .upsert(
                        json!({ "post_id": post_id, "user_id": user_id, "rating": rating }),
                        "post_id,user_id",
                    )
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's stored rating for a post, if any.
    pub async fn user_rating(&self, post_id: &str, user_id: Uuid) -> Result<Option<u8>> {
        let row = self
            .client
            .from("ratings")
            .select("rating")
            .eq("post_id", post_id)
            .eq("user_id", &user_id.to_string())
            .fetch_optional()
            .await?;
        Ok(row
            .and_then(|r| r.get("rating").and_then(Value::as_u64))
            .map(|r| r as u8))
    }

    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let rows = self
            .client
            .from("comments")
            .select("id, content, created_at, user_id, post_id")
            .eq("post_id", post_id)
            .order_desc("created_at")
            .fetch()
            .await?;
        Ok(rows.iter().filter_map(comment_from_row).collect())
    }

    pub async fn add_comment(
        &self,
        token: &str,
        post_id: &str,
        user_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        let rows = self
            .client
            .from("comments")
            .as_user(token)
            .insert(json!({
                "post_id": post_id,
                "user_id": user_id,
                "content": content,
            }))
            .await?;
        Ok(rows.first().and_then(comment_from_row))
    }

    /// Delete a comment. The user filter keeps this to the caller's own
    /// comments even if the row policy were permissive.
    pub async fn delete_comment(&self, token: &str, comment_id: &str, user_id: Uuid) -> Result<bool> {
        let deleted = self
            .client
            .from("comments")
            .as_user(token)
            .eq("id", comment_id)
            .eq("user_id", &user_id.to_string())
            .delete()
            .await?;
        Ok(!deleted.is_empty())
    }

    /// Bump the view counter. Best effort: a missing or failing
    /// procedure only logs, it never fails the page view.
    pub async fn increment_views(&self, post_id: &str) {
        if let Err(e) = self.client.rpc(VIEWS_RPC, json!({ "post_id": post_id })).await {
            debug!(post_id, "increment_views rpc failed: {}", e);
        }
    }
}

fn comment_from_row(row: &Value) -> Option<Comment> {
    Some(Comment {
        id: match row.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return None,
        },
        post_id: match row.get("post_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        user_id: row
            .get("user_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())?,
        content: row
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        created_at: row
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}
