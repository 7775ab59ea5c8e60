//! Frequency-ranked category listing for the default feed.

use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::store::ContentStore;

/// Rank category names by how many rows carry them, most frequent
/// first, ties broken alphabetically so the ordering is stable.
/// Blank and missing categories are dropped.
pub fn rank_categories(rows: &[Value], cap: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let name = row
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        if name.is_empty() {
            continue;
        }
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(cap).map(|(name, _)| name).collect()
}

/// Fetch and rank the category list. Errors degrade to an empty list;
/// the default feed simply shows no category blocks.
pub async fn fetch_top_categories<S: ContentStore>(
    store: &S,
    scan_cap: usize,
    list_cap: usize,
) -> Vec<String> {
    match store.category_rows(scan_cap).await {
        Ok(rows) => rank_categories(&rows, list_cap),
        Err(e) => {
            warn!("category listing failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rank_categories_by_frequency() {
        let rows = vec![
            json!({ "category": "Finance" }),
            json!({ "category": "Health" }),
            json!({ "category": "Finance" }),
            json!({ "category": " Finance " }),
            json!({ "category": "Health" }),
            json!({ "category": "Fiction" }),
        ];
        assert_eq!(rank_categories(&rows, 10), vec!["Finance", "Health", "Fiction"]);
    }

    #[test]
    fn test_rank_categories_drops_blank_and_caps() {
        let rows = vec![
            json!({ "category": "" }),
            json!({ "category": "   " }),
            json!({}),
            json!({ "category": null }),
            json!({ "category": "B" }),
            json!({ "category": "A" }),
        ];
        // equal counts tie-break alphabetically, cap applies after sort
        assert_eq!(rank_categories(&rows, 1), vec!["A"]);
    }
}
