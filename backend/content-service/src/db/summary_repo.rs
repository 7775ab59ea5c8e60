//! Summary reads: slug/id resolution, aggregate stats, recommendations.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use supabase_rest::SupabaseClient;
use tracing::{debug, warn};

use uuid::Uuid;

use crate::db::CONTENT_TABLE;
use crate::error::{AppError, Result};
use crate::models::{CreateSummaryRequest, Summary, SummaryStats, UpdateSummaryRequest};
use feed_service::normalizer::{normalize_row, normalize_rows};
use feed_service::store::COUNTED_COLUMNS;
use feed_service::ContentItem;

/// Cheap column list for the first paint of a summary page.
const LIGHT_SELECT: &str = "
    id,
    slug,
    title,
    author,
    summary,
    category,
    image_url,
    affiliate_link,
    created_at
";

const AVERAGE_RATING_RPC: &str = "get_average_rating";
const RECOMMENDED_RPC: &str = "get_top_viewed_by_category";
const RECOMMENDED_SCAN_CAP: usize = 500;

pub struct SummaryRepo {
    client: SupabaseClient,
}

impl SummaryRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Summary>> {
        let row = self
            .client
            .from(CONTENT_TABLE)
            .select(LIGHT_SELECT)
            .eq("slug", slug)
            .fetch_optional()
            .await?;
        Ok(row.as_ref().map(summary_from_row))
    }

    /// Look up by id. Values the id column cannot hold (a slug matched
    /// against a uuid column gets a 400 from the REST layer) are a
    /// miss, not a failure.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Summary>> {
        let row = match self
            .client
            .from(CONTENT_TABLE)
            .select(LIGHT_SELECT)
            .eq("id", id)
            .fetch_optional()
            .await
        {
            Ok(row) => row,
            Err(e) if e.is_invalid_input() => None,
            Err(e) => return Err(e.into()),
        };
        Ok(row.as_ref().map(summary_from_row))
    }

    /// Aggregate counts plus the average rating. The rating procedure
    /// is preferred; when it is missing the ratings table is averaged
    /// directly.
    pub async fn stats(&self, id: &str) -> Result<SummaryStats> {
        let row = self
            .client
            .from(CONTENT_TABLE)
            .select(COUNTED_COLUMNS)
            .eq("id", id)
            .fetch_optional()
            .await?;

        let counts = row.as_ref().map(normalize_row).unwrap_or_else(|| {
            warn!(id, "counts row missing, serving zeros");
            normalize_row(&Value::Null)
        });

        Ok(SummaryStats {
            likes_count: counts.likes_count,
            views_count: counts.views_count,
            comments_count: counts.comments_count,
            avg_rating: self.average_rating(id).await,
        })
    }

    /// Average rating rounded to one decimal; `None` when unrated or
    /// when both the procedure and the fallback fail.
    pub async fn average_rating(&self, id: &str) -> Option<f64> {
        match self
            .client
            .rpc(AVERAGE_RATING_RPC, json!({ "p_post_id": id }))
            .await
        {
            Ok(Value::Array(rows)) => rows
                .first()
                .and_then(|r| r.get("average_rating"))
                .and_then(Value::as_f64)
                .map(round_one_decimal),
            Ok(_) => None,
            Err(e) => {
                debug!(id, "average rating rpc failed, averaging the ratings table: {}", e);
                self.average_from_table(id).await
            }
        }
    }

    async fn average_from_table(&self, id: &str) -> Option<f64> {
        let rows = self
            .client
            .from("ratings")
            .select("rating")
            .eq("post_id", id)
            .fetch()
            .await
            .ok()?;
        let ratings: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.get("rating").and_then(Value::as_f64))
            .collect();
        if ratings.is_empty() {
            return None;
        }
        Some(round_one_decimal(
            ratings.iter().sum::<f64>() / ratings.len() as f64,
        ))
    }

    /// Publish a new summary under the caller's identity. The slug is
    /// derived from the title; a taken slug gets a numeric suffix,
    /// probing `-2`, `-3`, ... until a free one is found.
    pub async fn create(
        &self,
        token: &str,
        user_id: Uuid,
        req: &CreateSummaryRequest,
    ) -> Result<Summary> {
        let slug = self.unique_slug(&req.title).await?;
        let rows = self
            .client
            .from(CONTENT_TABLE)
            .as_user(token)
            .insert(json!({
                "title": req.title.trim(),
                "author": req.author.trim(),
                "summary": req.summary,
                "category": req.category.trim(),
                "user_id": user_id,
                "image_url": req.image_url,
                "affiliate_link": req.affiliate_link,
                "slug": slug,
            }))
            .await?;
        rows.first().map(summary_from_row).ok_or_else(|| {
            AppError::Upstream("store returned no row for the new summary".to_string())
        })
    }

    /// Apply an edit to the caller's own summary. Returns `None` when
    /// no row was touched, either because the id does not exist or the
    /// row policy kept the caller away from it.
    pub async fn update(
        &self,
        token: &str,
        id: &str,
        req: &UpdateSummaryRequest,
    ) -> Result<Option<Summary>> {
        let mut patch = serde_json::Map::new();
        if let Some(title) = req.title.as_deref() {
            patch.insert("title".into(), json!(title.trim()));
        }
        if let Some(author) = req.author.as_deref() {
            patch.insert("author".into(), json!(author.trim()));
        }
        if let Some(summary) = req.summary.as_deref() {
            patch.insert("summary".into(), json!(summary));
        }
        if let Some(category) = req.category.as_deref() {
            patch.insert("category".into(), json!(category.trim()));
        }

        let rows = self
            .client
            .from(CONTENT_TABLE)
            .as_user(token)
            .eq("id", id)
            .update(Value::Object(patch))
            .await?;
        Ok(rows.first().map(summary_from_row))
    }

    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = slugify(title);
        let base = if base.is_empty() {
            "summary".to_string()
        } else {
            base
        };

        if !self.slug_taken(&base).await? {
            return Ok(base);
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{}-{}", base, counter);
            if !self.slug_taken(&candidate).await? {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool> {
        let row = self
            .client
            .from(CONTENT_TABLE)
            .select("id")
            .eq("slug", slug)
            .fetch_optional()
            .await?;
        Ok(row.is_some())
    }

    /// Most-viewed items in the same category, excluding the summary
    /// being read. Procedure first, views-sorted category scan when it
    /// is unavailable.
    pub async fn recommended(
        &self,
        category: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let category = category.trim();
        if category.is_empty() {
            return Ok(Vec::new());
        }

        match self
            .client
            .rpc(
                RECOMMENDED_RPC,
                json!({ "p_limit": limit, "p_category": category }),
            )
            .await
        {
            Ok(Value::Array(rows)) => {
                let mut items: Vec<ContentItem> = normalize_rows(&rows)
                    .into_iter()
                    .filter(|item| item.id != exclude_id)
                    .collect();
                items.truncate(limit);
                return Ok(items);
            }
            Ok(_) => debug!(category, "recommended rpc returned no usable payload"),
            Err(e) => debug!(category, "recommended rpc failed, scanning category: {}", e),
        }

        let rows = self
            .client
            .from(CONTENT_TABLE)
            .select(COUNTED_COLUMNS)
            .neq("id", exclude_id)
            .eq("category", category)
            .limit(RECOMMENDED_SCAN_CAP)
            .fetch()
            .await?;

        let mut items: Vec<ContentItem> = normalize_rows(&rows)
            .into_iter()
            .filter(|item| item.id != exclude_id)
            .collect();
        items.sort_by(|a, b| {
            b.views_count
                .cmp(&a.views_count)
                .then(b.likes_count.cmp(&a.likes_count))
                .then(b.recency().cmp(&a.recency()))
        });
        items.truncate(limit);
        Ok(items)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// URL slug from a title: lowercased, runs of anything non-alphanumeric
/// collapsed to single dashes, no leading or trailing dash.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn summary_from_row(row: &Value) -> Summary {
    let text = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let optional = |key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);

    Summary {
        id: match row.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        slug: optional("slug"),
        title: text("title"),
        author: text("author"),
        summary: text("summary"),
        category: text("category").trim().to_string(),
        image_url: optional("image_url"),
        affiliate_link: optional("affiliate_link"),
        created_at: row
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_row_trims_category_and_stringifies_id() {
        let row = json!({
            "id": 42,
            "title": "Deep Work",
            "author": "Cal Newport",
            "category": "  Productivity  ",
            "created_at": "2024-01-01T00:00:00Z",
        });
        let summary = summary_from_row(&row);
        assert_eq!(summary.id, "42");
        assert_eq!(summary.category, "Productivity");
        assert!(summary.slug.is_none());
        assert!(summary.created_at.is_some());
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(4.4499), 4.4);
        assert_eq!(round_one_decimal(4.45), 4.5);
        assert_eq!(round_one_decimal(0.0), 0.0);
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("Deep Work"), "deep-work");
        assert_eq!(slugify("  The 4-Hour Workweek!  "), "the-4-hour-workweek");
        assert_eq!(slugify("Don't Make Me Think"), "don-t-make-me-think");
        assert_eq!(slugify("C++ & Rust: A Comparison"), "c-rust-a-comparison");
    }

    #[test]
    fn test_slugify_degenerate_titles() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("---"), "");
    }
}
