//! JSON output formatter

use concierge_core::StoredKnowledgeEntry;
use serde::Serialize;

pub fn format_value<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

/// Entries without their raw vectors
pub fn format_entries(entries: &[StoredKnowledgeEntry]) -> String {
    let output: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "id": e.id,
                "title": e.title,
                "category": e.category,
                "content": e.content,
                "embedded": e.embedding.is_some(),
            })
        })
        .collect();

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}
