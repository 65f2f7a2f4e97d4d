//! # Reference Resolver Module
//!
//! ## Purpose
//! Detects explicit legal-citation patterns in a query ("Section 302",
//! "Article 21", "sec 498A") and resolves them to exact title matches in the
//! document store, bypassing statistical search entirely.
//!
//! ## Input/Output Specification
//! - **Input**: Free-text query, result cap
//! - **Output**: Documents whose titles carry the cited number, or are an
//!   exact match for the normalized query
//!
//! A user who names the exact provision deserves a deterministic answer, so
//! this tier always runs first and its matches are never overridden by the
//! fuzzier tiers.

use crate::errors::Result;
use crate::retrieval::SearchTier;
use crate::store::DocumentStore;
use crate::text::normalize_title;
use crate::Hit;
use regex::Regex;
use std::sync::Arc;

/// Citation pattern over the normalized query: an optional reference keyword,
/// an optional separator, then a numeric token with optional trailing
/// letters/hyphen (302, 498a, 21-a).
const CITATION_PATTERN: &str = r"(?:article|section|sec|art)?\s*[:#]?\s*([0-9]+[a-z\-]*)";

/// Exact-citation search tier
pub struct ReferenceResolver {
    store: Arc<DocumentStore>,
    pattern: Regex,
}

impl ReferenceResolver {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            // pattern is a compile-time constant, cannot fail
            pattern: Regex::new(CITATION_PATTERN).expect("valid citation pattern"),
        }
    }

    /// Resolve an explicit citation to title matches.
    ///
    /// First tries the numeric token captured by the citation pattern as a
    /// case-insensitive title substring; when the pattern does not match (or
    /// matches no rows), falls back to an exact match of the fully normalized
    /// query against lowercased titles. Returns empty when neither applies.
    pub fn resolve(&self, query: &str, max_results: usize) -> Result<Vec<Hit>> {
        let normalized = normalize_title(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(caps) = self.pattern.captures(&normalized) {
            if let Some(token) = caps.get(1) {
                let hits = self.store.find_title_contains(token.as_str(), max_results)?;
                if !hits.is_empty() {
                    tracing::debug!(token = token.as_str(), count = hits.len(), "Citation token matched");
                    return Ok(hits);
                }
            }
        }

        self.store.find_title_exact(&normalized, max_results)
    }
}

impl SearchTier for ReferenceResolver {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        self.resolve(query, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::DocumentEntry;

    fn seeded_store() -> Arc<DocumentStore> {
        let store = DocumentStore::in_memory(&StorageConfig::default()).unwrap();
        store
            .replace_all(&[
                DocumentEntry {
                    title: "Article 21".to_string(),
                    content: "Protection of life and personal liberty.".to_string(),
                    source: "COI.json".to_string(),
                },
                DocumentEntry {
                    title: "Section 302 - Punishment for murder".to_string(),
                    content: "Whoever commits murder shall be punished...".to_string(),
                    source: "IPC.json".to_string(),
                },
                DocumentEntry {
                    title: "Section 498A - Cruelty by husband or relatives".to_string(),
                    content: "Whoever, being the husband...".to_string(),
                    source: "IPC.json".to_string(),
                },
            ])
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn resolves_section_number() {
        let resolver = ReferenceResolver::new(seeded_store());
        let hits = resolver.resolve("Section 302", 5).unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].title.contains("302"));
    }

    #[test]
    fn resolves_article_inside_question() {
        let resolver = ReferenceResolver::new(seeded_store());
        let hits = resolver.resolve("What is Article 21?", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].title.contains("21"));
    }

    #[test]
    fn resolves_alphanumeric_section() {
        let resolver = ReferenceResolver::new(seeded_store());
        let hits = resolver.resolve("sec 498A", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].title.contains("498A"));
    }

    #[test]
    fn exact_title_without_number() {
        let store = DocumentStore::in_memory(&StorageConfig::default()).unwrap();
        store
            .replace_all(&[DocumentEntry {
                title: "Preamble".to_string(),
                content: "We, the people of India...".to_string(),
                source: "COI.json".to_string(),
            }])
            .unwrap();
        let resolver = ReferenceResolver::new(Arc::new(store));

        // no numeric token, but the normalized query equals a stored title
        let hits = resolver.resolve("Preamble!", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Preamble");
    }

    #[test]
    fn unmatched_query_is_empty() {
        let resolver = ReferenceResolver::new(seeded_store());
        assert!(resolver.resolve("banana", 5).unwrap().is_empty());
        assert!(resolver.resolve("", 5).unwrap().is_empty());
        assert!(resolver.resolve("?!", 5).unwrap().is_empty());
    }

    #[test]
    fn caps_results() {
        let resolver = ReferenceResolver::new(seeded_store());
        // "Section" alone has no numeric token and no exact title match
        assert!(resolver.resolve("Section", 5).unwrap().is_empty());
        let hits = resolver.resolve("section 302", 1).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
