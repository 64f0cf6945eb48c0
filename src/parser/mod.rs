//! Content normalization for raw generation output
//!
//! Turns raw generated text — possibly JSON, possibly prose — into a fully
//! populated [`NormalizedContent`] record. The parser is infallible: every
//! field has a fallback-generation rule, so malformed input degrades to
//! defaults instead of raising field-level errors.

pub mod extract;

use serde_json::Value;

use crate::models::NormalizedContent;

/// Parse raw generation output into a normalized content record
///
/// Strategy is JSON-first: when the text decodes to a JSON object, each
/// target field is read from it and any missing field falls back to its
/// dedicated extractor, seeded with the full raw text. When the decode
/// fails, the whole text is treated as prose and every extractor runs.
///
/// Category is passed through only when explicitly present in a JSON
/// response; the publisher applies its own default otherwise.
pub fn parse(raw: &str) -> NormalizedContent {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => from_json_object(&map, raw),
        _ => from_prose(raw),
    }
}

fn from_json_object(map: &serde_json::Map<String, Value>, raw: &str) -> NormalizedContent {
    let title = string_field(map, "title").unwrap_or_else(|| extract::title(raw));

    let body = string_field(map, "content").unwrap_or_else(|| raw.to_string());

    let meta_description =
        string_field(map, "meta_description").unwrap_or_else(|| extract::meta_description(raw));

    let tags = match map.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        // A comma-separated string is accepted as a convenience coercion
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => extract::tags(raw),
    };

    let focus_keyword =
        string_field(map, "focus_keyword").unwrap_or_else(|| extract::focus_keyword(&tags));

    let category = string_field(map, "category");

    NormalizedContent {
        title,
        body,
        meta_description,
        tags,
        focus_keyword,
        category,
    }
}

fn from_prose(raw: &str) -> NormalizedContent {
    let tags = extract::tags(raw);
    let focus_keyword = extract::focus_keyword(&tags);

    NormalizedContent {
        title: extract::title(raw),
        body: extract::body(raw),
        meta_description: extract::meta_description(raw),
        tags,
        focus_keyword,
        category: None,
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        // Numeric values are coerced rather than dropped
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
