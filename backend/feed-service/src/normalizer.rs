//! Defensive normalization of raw store rows.
//!
//! Depending on the query shape, derived counts arrive as a plain
//! number, a numeric string, a one-element aggregate list
//! (`[{"count": 3}]`) or a nested aggregate object (`{"avg": "4.2"}`).
//! Every coercion here is total: an unparseable value is 0, never an
//! error, so all fetch paths can share one normalizer.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::ContentItem;

/// Keys an aggregate payload may hide its value behind.
const AGGREGATE_KEYS: &[&str] = &["avg", "count", "value", "avg_rating", "rating", "rating_count"];

/// Coerce an arbitrary JSON value to a number.
///
/// Ordered matcher chain, first success wins:
/// scalar number → numeric string → single-element list → aggregate
/// object → 0.
pub fn parse_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        Value::Array(items) => items.first().map(parse_aggregate).unwrap_or(0.0),
        Value::Object(_) => parse_aggregate(value),
        _ => 0.0,
    }
}

fn parse_aggregate(value: &Value) -> f64 {
    if let Value::Object(map) = value {
        for key in AGGREGATE_KEYS {
            if let Some(inner) = map.get(*key) {
                if !inner.is_null() {
                    return parse_number(inner);
                }
            }
        }
        return 0.0;
    }
    parse_number(value)
}

/// Non-negative integer coercion for derived counts.
pub fn parse_count(value: &Value) -> u64 {
    parse_number(value).max(0.0) as u64
}

fn text(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_text(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn id_text(row: &Value) -> String {
    match row.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_timestamp(row: &Value) -> Option<DateTime<Utc>> {
    row.get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert one raw row into the canonical record. Pure, never panics.
pub fn normalize_row(row: &Value) -> ContentItem {
    let avg_rating = ["avg_rating", "avg", "rating", "average_rating"]
        .iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
        .map(parse_number)
        .unwrap_or(0.0)
        .clamp(0.0, 5.0);

    let rating_count = ["rating_count", "ratings_count", "count"]
        .iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
        .map(parse_count)
        .unwrap_or(0);

    ContentItem {
        id: id_text(row),
        slug: optional_text(row, "slug"),
        title: text(row, "title"),
        author: text(row, "author"),
        summary: text(row, "summary"),
        category: text(row, "category").trim().to_string(),
        image_url: optional_text(row, "image_url"),
        affiliate_link: optional_text(row, "affiliate_link"),
        likes_count: row.get("likes_count").map(parse_count).unwrap_or(0),
        views_count: row.get("views_count").map(parse_count).unwrap_or(0),
        comments_count: row.get("comments_count").map(parse_count).unwrap_or(0),
        rating_count,
        avg_rating,
        created_at: parse_timestamp(row),
    }
}

/// Normalize a page of rows.
pub fn normalize_rows(rows: &[Value]) -> Vec<ContentItem> {
    rows.iter().map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_scalar_shapes() {
        assert_eq!(parse_number(&json!(7)), 7.0);
        assert_eq!(parse_number(&json!(4.5)), 4.5);
        assert_eq!(parse_number(&json!("12")), 12.0);
        assert_eq!(parse_number(&json!("4.2")), 4.2);
    }

    #[test]
    fn test_parse_number_aggregate_shapes() {
        assert_eq!(parse_number(&json!([{ "count": 3 }])), 3.0);
        assert_eq!(parse_number(&json!([{ "avg": "4.2" }])), 4.2);
        assert_eq!(parse_number(&json!({ "count": "9" })), 9.0);
        assert_eq!(parse_number(&json!({ "avg": 3.1 })), 3.1);
        // nested string inside a list inside an object key
        assert_eq!(parse_number(&json!([{ "value": "2" }])), 2.0);
    }

    #[test]
    fn test_parse_number_totality_on_malformed_input() {
        assert_eq!(parse_number(&Value::Null), 0.0);
        assert_eq!(parse_number(&json!("not a number")), 0.0);
        assert_eq!(parse_number(&json!([])), 0.0);
        assert_eq!(parse_number(&json!([{ "unrelated": 5 }])), 0.0);
        assert_eq!(parse_number(&json!({ "unrelated": 5 })), 0.0);
        assert_eq!(parse_number(&json!(true)), 0.0);
        assert_eq!(parse_number(&json!("NaN")), 0.0);
        assert_eq!(parse_number(&json!("inf")), 0.0);
    }

    #[test]
    fn test_parse_count_never_negative() {
        assert_eq!(parse_count(&json!(-3)), 0);
        assert_eq!(parse_count(&json!("-1")), 0);
        assert_eq!(parse_count(&json!(5)), 5);
    }

    #[test]
    fn test_normalize_row_counts_from_mixed_shapes() {
        let row = json!({
            "id": "abc",
            "slug": "deep-work",
            "title": "Deep Work",
            "author": "Cal Newport",
            "summary": "Focus.",
            "category": "  Productivity ",
            "image_url": "https://img",
            "affiliate_link": null,
            "likes_count": [{ "count": 14 }],
            "views_count": "230",
            "comments_count": { "count": 2 },
            "avg_rating": [{ "avg": "4.4" }],
            "rating_count": 9,
            "created_at": "2024-03-01T10:00:00Z"
        });
        let item = normalize_row(&row);
        assert_eq!(item.likes_count, 14);
        assert_eq!(item.views_count, 230);
        assert_eq!(item.comments_count, 2);
        assert_eq!(item.avg_rating, 4.4);
        assert_eq!(item.rating_count, 9);
        assert_eq!(item.category, "Productivity");
        assert_eq!(item.slug.as_deref(), Some("deep-work"));
        assert!(item.created_at.is_some());
        assert_eq!(item.address(), "deep-work");
    }

    #[test]
    fn test_normalize_row_defaults_on_empty_row() {
        let item = normalize_row(&json!({}));
        assert_eq!(item.id, "");
        assert_eq!(item.slug, None);
        assert_eq!(item.likes_count, 0);
        assert_eq!(item.avg_rating, 0.0);
        assert_eq!(item.created_at, None);
        // missing timestamp sorts as oldest
        assert_eq!(item.recency(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_normalize_row_numeric_id_is_stringified() {
        let item = normalize_row(&json!({ "id": 42 }));
        assert_eq!(item.id, "42");
        assert_eq!(item.address(), "42");
    }

    #[test]
    fn test_avg_rating_clamped_to_scale() {
        let item = normalize_row(&json!({ "avg_rating": "9.7" }));
        assert_eq!(item.avg_rating, 5.0);
    }

    #[test]
    fn test_avg_rating_alias_keys() {
        assert_eq!(normalize_row(&json!({ "avg": 3.0 })).avg_rating, 3.0);
        assert_eq!(normalize_row(&json!({ "rating": "2.5" })).avg_rating, 2.5);
        assert_eq!(
            normalize_row(&json!({ "average_rating": [{ "avg": 4.0 }] })).avg_rating,
            4.0
        );
    }
}
