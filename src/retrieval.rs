//! # Retrieval Orchestrator Module
//!
//! ## Purpose
//! Composes the three search tiers — reference resolution, lexical match,
//! semantic similarity — into a single strict-fallback search: tiers run in
//! precision order and the first non-empty result set wins outright.
//!
//! ## Input/Output Specification
//! - **Input**: Free-text query, requested result count
//! - **Output**: `"title: content"` strings from the winning tier; empty when
//!   every tier came up empty
//!
//! Rationale: an explicit citation match is always correct and must never be
//! overridden by fuzzier tiers; keyword match needs no model inference and is
//! cheap; semantic search is the costly last resort. Results are never merged
//! across tiers. A tier that errors is treated as an empty tier.

use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::Hit;

/// A single search strategy over the fixed `search(query, top_k)` contract.
/// All three tiers implement this, which keeps tier selection a matter of
/// construction rather than scattered availability checks.
pub trait SearchTier: Send + Sync {
    /// Tier name for logging
    fn name(&self) -> &'static str;

    /// Ranked results, best first, at most `top_k`
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>>;
}

/// Tiered fallback controller
pub struct RetrievalEngine {
    reference: Box<dyn SearchTier>,
    lexical: Box<dyn SearchTier>,
    semantic: Box<dyn SearchTier>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        reference: Box<dyn SearchTier>,
        lexical: Box<dyn SearchTier>,
        semantic: Box<dyn SearchTier>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            reference,
            lexical,
            semantic,
            config,
        }
    }

    /// Configured tier-2/tier-3 result count
    pub fn default_top_k(&self) -> usize {
        self.config.default_top_k
    }

    /// Run the tiers in order and return the first non-empty result set,
    /// formatted as `"title: content"` strings. Empty means no tier matched.
    ///
    /// A tier failing with a recoverable error (missing index, absent model)
    /// counts as empty; anything else propagates to the caller.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let plan: [(&dyn SearchTier, usize); 3] = [
            (self.reference.as_ref(), self.config.reference_max_results),
            (self.lexical.as_ref(), top_k),
            (self.semantic.as_ref(), top_k),
        ];

        for (tier, limit) in plan {
            match tier.search(query, limit) {
                Ok(hits) if !hits.is_empty() => {
                    tracing::debug!(tier = tier.name(), count = hits.len(), "Tier produced results");
                    return Ok(hits
                        .into_iter()
                        .map(|h| format!("{}: {}", h.title, h.content))
                        .collect());
                }
                Ok(_) => {
                    tracing::debug!(tier = tier.name(), "Tier empty, falling through");
                }
                Err(e) if e.is_tier_recoverable() => {
                    tracing::warn!(
                        tier = tier.name(),
                        category = e.category(),
                        error = %e,
                        "Tier unavailable, treating as empty"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Vec::new())
    }
}
