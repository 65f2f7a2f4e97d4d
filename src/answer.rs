//! # Answer Composer Module
//!
//! ## Purpose
//! Turns retrieval results (or their absence) into the final user-facing
//! answer: matched provisions as a bulleted list, or canned informational
//! text for the question's topic category, always closed with a fixed
//! disclaimer footer.
//!
//! ## Input/Output Specification
//! - **Input**: Free-text legal question
//! - **Output**: Multi-line plain-text response
//!
//! The composer never raises: any internal failure is caught at the top and
//! converted into a generic apology. Categorization is keyword-based and is
//! used only as a fallback content source — it never influences which
//! retrieval tier runs.

use crate::errors::Result;
use crate::retrieval::RetrievalEngine;
use rand::seq::SliceRandom;

/// Topic buckets checked in declaration order; first match wins
const CATEGORIES: &[Category] = &[
    Category {
        name: "contract",
        keywords: &["contract", "agreement"],
        templates: &[
            "A contract requires offer, acceptance, and consideration.",
            "Both parties must voluntarily agree to the terms.",
        ],
    },
    Category {
        name: "property",
        keywords: &["property", "land", "ownership"],
        templates: &[
            "Property laws vary based on ownership type: joint, leasehold, freehold, etc.",
        ],
    },
    Category {
        name: "employment",
        keywords: &["job", "employment", "salary"],
        templates: &["Employees have a right to a safe work environment and fair wages."],
    },
    Category {
        name: "family",
        keywords: &["divorce", "custody", "marriage"],
        templates: &["Family law covers marriage, divorce, child custody, and inheritance."],
    },
    Category {
        name: "criminal",
        keywords: &["crime", "murder", "theft", "criminal"],
        templates: &["Criminal law: innocent until proven guilty. Legal representation is important."],
    },
    Category {
        name: "civil",
        keywords: &["sue", "lawsuit", "damages"],
        templates: &["Civil law deals with disputes between individuals or organizations."],
    },
];

const GENERAL_LEGAL_INFO: &[&str] = &[
    "Always maintain proper documentation for legal matters.",
    "Understanding your rights is the first step in legal protection.",
    "Seek legal counsel for case-specific guidance.",
];

const DISCLAIMER: &str = "DISCLAIMER: This is general information only and not legal advice.";

struct Category {
    name: &'static str,
    keywords: &'static [&'static str],
    templates: &'static [&'static str],
}

/// Classify a question into a topic bucket by keyword presence
fn categorize(question: &str) -> Option<&'static Category> {
    let q = question.to_lowercase();
    CATEGORIES
        .iter()
        .find(|c| c.keywords.iter().any(|k| q.contains(k)))
}

/// Formats retrieval output into complete answers
pub struct AnswerComposer {
    engine: RetrievalEngine,
    max_rendered_matches: usize,
}

impl AnswerComposer {
    pub fn new(engine: RetrievalEngine, max_rendered_matches: usize) -> Self {
        Self {
            engine,
            max_rendered_matches,
        }
    }

    /// Compose the response for a question. Never fails: internal errors are
    /// logged and replaced with a generic apology.
    pub fn compose(&self, question: &str) -> String {
        match self.compose_inner(question) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(category = e.category(), error = %e, "Answer composition failed");
                "I encountered an internal error while processing your question.".to_string()
            }
        }
    }

    fn compose_inner(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Ok("Please provide a legal question for assistance.".to_string());
        }

        tracing::debug!(question, "Processing legal question");
        let category = categorize(question);
        if let Some(c) = category {
            tracing::debug!(category = c.name, "Question categorized");
        }

        let mut parts: Vec<String> = Vec::new();
        parts.push(format!("Regarding your question: \"{}\"\n", question));

        let matches = self
            .engine
            .search(question, self.engine.default_top_k())?;
        if !matches.is_empty() {
            parts.push("Matched Legal References / Similar Documents:".to_string());
            parts.extend(
                matches
                    .iter()
                    .take(self.max_rendered_matches)
                    .map(|m| format!("\u{2022} {}", m)),
            );
        } else if let Some(c) = category {
            parts.push("Here's some general information that might be relevant:".to_string());
            parts.extend(c.templates.iter().map(|t| format!("\u{2022} {}", t)));
        } else {
            parts.push("General legal insights:".to_string());
            let mut rng = rand::thread_rng();
            parts.extend(
                GENERAL_LEGAL_INFO
                    .choose_multiple(&mut rng, 3.min(GENERAL_LEGAL_INFO.len()))
                    .map(|t| format!("\u{2022} {}", t)),
            );
        }

        parts.push("\nGeneral recommendations:".to_string());
        parts.push("\u{2022} Consult a qualified attorney for case-specific legal advice.".to_string());
        parts.push("\u{2022} Research applicable laws in your jurisdiction.".to_string());
        parts.push(format!("\n{}", "=".repeat(50)));
        parts.push(DISCLAIMER.to_string());
        parts.push("=".repeat(50));

        Ok(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetrievalConfig, StorageConfig};
    use crate::lexical::LexicalIndex;
    use crate::reference::ReferenceResolver;
    use crate::retrieval::SearchTier;
    use crate::store::DocumentStore;
    use crate::{DocumentEntry, Hit};
    use std::sync::Arc;

    struct EmptyTier;

    impl SearchTier for EmptyTier {
        fn name(&self) -> &'static str {
            "empty"
        }

        fn search(&self, _query: &str, _top_k: usize) -> crate::errors::Result<Vec<Hit>> {
            Ok(Vec::new())
        }
    }

    fn composer_over(entries: &[DocumentEntry]) -> AnswerComposer {
        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        store.replace_all(entries).unwrap();
        let engine = RetrievalEngine::new(
            Box::new(ReferenceResolver::new(store.clone())),
            Box::new(LexicalIndex::new(store)),
            Box::new(EmptyTier),
            RetrievalConfig::default(),
        );
        AnswerComposer::new(engine, 5)
    }

    fn entry(title: &str, content: &str) -> DocumentEntry {
        DocumentEntry {
            title: title.to_string(),
            content: content.to_string(),
            source: "test.json".to_string(),
        }
    }

    #[test]
    fn cited_article_renders_matched_references() {
        let composer = composer_over(&[entry(
            "Article 21",
            "Protection of life and personal liberty...",
        )]);
        let response = composer.compose("What is Article 21?");

        assert!(response.contains("Matched Legal References"));
        assert!(response
            .contains("\u{2022} Article 21: Protection of life and personal liberty..."));
        assert!(response.contains(DISCLAIMER));
    }

    #[test]
    fn keyword_question_falls_through_to_lexical() {
        let composer = composer_over(&[entry(
            "Section 302 - Punishment for murder",
            "Whoever commits murder shall be punished with death or imprisonment for life.",
        )]);
        let response = composer.compose("What is the punishment for murder?");

        assert!(response.contains("Matched Legal References"));
        assert!(response.contains("Section 302"));
    }

    #[test]
    fn no_matches_uses_category_templates() {
        let composer = composer_over(&[]);
        let response = composer.compose("How do I end my marriage?");

        assert!(response.contains("Here's some general information that might be relevant:"));
        assert!(response.contains("Family law covers marriage"));
        assert!(response.contains(DISCLAIMER));
    }

    #[test]
    fn uncategorized_question_samples_general_pool() {
        let composer = composer_over(&[]);
        let response = composer.compose("zzz qqq xyzzy");

        assert!(response.contains("General legal insights:"));
        // all three pool items fit, sampled without replacement
        let bullets = response
            .lines()
            .filter(|l| GENERAL_LEGAL_INFO.iter().any(|t| l.ends_with(t)))
            .count();
        assert_eq!(bullets, 3);
    }

    #[test]
    fn empty_question_prompts_for_input() {
        let composer = composer_over(&[]);
        assert_eq!(
            composer.compose("   "),
            "Please provide a legal question for assistance."
        );
    }

    #[test]
    fn category_order_is_first_match_wins() {
        // "property" appears before "criminal" in the declared order
        let c = categorize("crime on my property").unwrap();
        assert_eq!(c.name, "property");
        assert!(categorize("hello there").is_none());
    }

    #[test]
    fn categorization_never_shadows_retrieval() {
        // a criminal-category question still renders the retrieved document
        let composer = composer_over(&[entry(
            "Section 378 - Theft",
            "Whoever intends to take dishonestly any movable property...",
        )]);
        let response = composer.compose("What counts as theft?");

        assert!(response.contains("Matched Legal References"));
        assert!(!response.contains("innocent until proven guilty"));
    }
}
