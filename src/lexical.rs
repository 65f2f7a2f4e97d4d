//! # Lexical Index Module
//!
//! ## Purpose
//! Keyword search tier over the document store's FTS5 mirror of
//! (title, content), with a substring-containment fallback when the match
//! engine is unavailable.
//!
//! ## Input/Output Specification
//! - **Input**: Free-text query, result cap
//! - **Output**: Matching documents, engine rank (BM25) first; fallback path
//!   returns store insertion order
//!
//! Failure mode: a missing or corrupt index is indistinguishable from "no
//! matches" — this tier never surfaces index errors to the orchestrator.

use crate::errors::Result;
use crate::retrieval::SearchTier;
use crate::store::DocumentStore;
use crate::text::tokenize_words;
use crate::Hit;
use std::sync::Arc;

/// Full-text keyword search tier
pub struct LexicalIndex {
    store: Arc<DocumentStore>,
}

impl LexicalIndex {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Token-match search over title+content, truncated to `top_k`.
    ///
    /// Query words are quoted and OR-ed so a question matches documents
    /// containing any of its terms, ranked by the engine. When FTS is
    /// unavailable the whole query string is tested for case-insensitive
    /// containment against title OR content instead.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        let tokens = tokenize_words(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let match_query = tokens
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR ");

        match self.store.match_fulltext(&match_query, top_k) {
            Ok(hits) => Ok(hits),
            Err(e) => {
                tracing::debug!(error = %e, "Match engine unavailable, trying substring fallback");
                match self.store.scan_substring(query, top_k) {
                    Ok(hits) => Ok(hits),
                    Err(e) => {
                        tracing::warn!(error = %e, "Lexical fallback failed, treating as no matches");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}

impl SearchTier for LexicalIndex {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        LexicalIndex::search(self, query, top_k)
    }
}
