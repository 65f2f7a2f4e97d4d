//! # Schema-Tolerant Extraction Module
//!
//! ## Purpose
//! Guesses (title, content) pairs out of heterogeneous legal-corpus JSON:
//! constitution dumps keyed by article number, penal-code lists with
//! `Section`/`ClauseDesc` fields, and free-form nested objects.
//!
//! ## Input/Output Specification
//! - **Input**: A parsed JSON document plus its source file name
//! - **Output**: Ordered `(title, content, source)` entries
//!
//! Extraction tries an explicit priority-ordered list of candidate keys per
//! shape, and falls back to depth-first concatenation of every string leaf
//! (object keys in insertion order, newline-joined) when no candidate key
//! yields content.

use crate::errors::{KanoonError, Result};
use crate::DocumentEntry;
use serde_json::Value;

/// Title candidate keys, tried in priority order
const TITLE_KEYS: &[&str] = &["title", "ArtNo", "Name", "Article", "Section", "section", "name"];

/// Content candidate keys, tried in priority order
const CONTENT_KEYS: &[&str] = &[
    "content",
    "ArtDesc",
    "ClauseDesc",
    "Clause",
    "description",
    "section_text",
];

/// Depth-first concatenation of all textual leaves under a JSON node.
/// Object values follow key insertion order; empty fragments are dropped.
pub fn collect_text(node: &Value) -> String {
    match node {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(collect_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .values()
            .map(collect_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_key_text(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(scalar_text))
        .find(|t| !t.is_empty())
}

/// Guess title and content from a list-item object
fn extract_titled_item(map: &serde_json::Map<String, Value>) -> (String, String) {
    let title = first_key_text(map, TITLE_KEYS).unwrap_or_else(|| {
        // combine known key pairs before giving up on a readable title
        match (
            map.get("ArtNo").and_then(scalar_text),
            map.get("Section").and_then(scalar_text),
            map.get("Name").and_then(scalar_text),
        ) {
            (Some(art), _, Some(name)) => format!("Article {} - {}", art, name),
            (_, Some(sec), Some(name)) => format!("Section {} - {}", sec, name),
            _ => Value::Object(map.clone()).to_string().chars().take(80).collect(),
        }
    });

    let content = match map.get(CONTENT_KEYS[0]).or_else(|| {
        CONTENT_KEYS[1..]
            .iter()
            .find_map(|k| map.get(*k))
    }) {
        Some(Value::Array(items)) => items
            .iter()
            .map(collect_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(v) => {
            let text = collect_text(v);
            if text.is_empty() {
                collect_text(&Value::Object(map.clone()))
            } else {
                text
            }
        }
        None => collect_text(&Value::Object(map.clone())),
    };

    (title.trim().to_string(), content.trim().to_string())
}

/// Extract document entries from one parsed JSON source file.
///
/// Supported top-level shapes: a mapping from provision key to string or
/// nested object, or a list of heterogeneous provision objects. Anything
/// else is a malformed source.
pub fn extract_entries(value: &Value, source: &str) -> Result<Vec<DocumentEntry>> {
    let mut entries = Vec::new();

    match value {
        Value::Object(map) => {
            for (key, item) in map {
                let (title, content) = match item {
                    Value::String(s) => (key.clone(), s.trim().to_string()),
                    Value::Object(inner) => {
                        let title = inner
                            .get("title")
                            .and_then(scalar_text)
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| key.clone());
                        let content = inner
                            .get("content")
                            .and_then(scalar_text)
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| collect_text(item));
                        (title, content)
                    }
                    other => (key.clone(), collect_text(other)),
                };
                entries.push(DocumentEntry {
                    title,
                    content,
                    source: source.to_string(),
                });
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => {
                        let (title, content) = extract_titled_item(map);
                        if title.is_empty() && content.is_empty() {
                            continue;
                        }
                        entries.push(DocumentEntry {
                            title,
                            content,
                            source: source.to_string(),
                        });
                    }
                    other => {
                        tracing::debug!(source, "Skipping non-object list item: {}", other);
                    }
                }
            }
        }
        _ => {
            return Err(KanoonError::MalformedSource {
                file: source.to_string(),
                details: "Unsupported top-level JSON shape".to_string(),
            });
        }
    }

    Ok(entries)
}
