//! # Kanoon Legal Retrieval Engine
//!
//! ## Overview
//! This library implements the retrieval and answer-composition core of a
//! question-answering assistant for Indian law. A tiered search pipeline
//! runs over a local corpus (Constitution of India, Indian Penal Code and
//! related acts): citation reference resolution first, SQLite full-text
//! search second, semantic embedding search last, with the first non-empty
//! tier winning.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `ingestion`: Schema-tolerant JSON corpus loading into the store
//! - `store`: SQLite document storage with an FTS5 mirror
//! - `text`: Title normalization and word tokenization
//! - `reference`: Article/Section citation resolution
//! - `lexical`: Full-text search with substring fallback
//! - `vector`: Sentence-embedding index and cosine similarity search
//! - `retrieval`: Tiered fallback orchestration
//! - `answer`: Grounded answer composition with category templates
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Legal corpus files (JSON), user questions (text)
//! - **Output**: Composed answers grounded in retrieved provisions
//!
//! ## Usage
//! ```rust,no_run
//! use kanoon_search::{Config, LegalAssistant};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let assistant = LegalAssistant::open(config)?;
//!     println!("{}", assistant.ask("What is Article 21?"));
//!     Ok(())
//! }
//! ```

// Core modules
pub mod answer;
pub mod config;
pub mod errors;
pub mod ingestion;
pub mod lexical;
pub mod reference;
pub mod retrieval;
pub mod store;
pub mod text;
pub mod vector;

// Re-exports for convenience
pub use answer::AnswerComposer;
pub use config::Config;
pub use errors::{KanoonError, Result};
pub use retrieval::{RetrievalEngine, SearchTier};

use crate::lexical::LexicalIndex;
use crate::reference::ReferenceResolver;
use crate::store::DocumentStore;
use crate::vector::{FastEmbedder, VectorIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored legal provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Rowid assigned by the store; stable for a given corpus build
    pub id: i64,
    /// Provision heading, e.g. `"Article 21"` or `"Section 302"`
    pub title: String,
    /// Provision text; may be empty for heading-only entries
    pub content: String,
    /// Corpus file the provision was extracted from
    pub source: String,
}

/// A provision awaiting insertion (no id yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub title: String,
    pub content: String,
    pub source: String,
}

/// One retrieved provision, as returned by a search tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub title: String,
    pub content: String,
}

/// Fully wired question-answering facade.
///
/// Owns the store, the three search tiers and the answer composer. `ask`
/// never fails: retrieval errors surface as an apology in the answer text.
pub struct LegalAssistant {
    composer: AnswerComposer,
}

impl LegalAssistant {
    /// Open the stored corpus and wire up the full retrieval pipeline
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(DocumentStore::open(&config.storage)?);
        let embedder = Arc::new(FastEmbedder::new(config.embedding.clone()));

        let reference = ReferenceResolver::new(Arc::clone(&store));
        let lexical = LexicalIndex::new(Arc::clone(&store));
        let semantic = VectorIndex::new(
            Arc::clone(&store),
            embedder,
            config.embedding.index_path.clone(),
        );

        let engine = RetrievalEngine::new(
            Box::new(reference),
            Box::new(lexical),
            Box::new(semantic),
            config.retrieval.clone(),
        );

        Ok(Self {
            composer: AnswerComposer::new(engine, config.retrieval.max_rendered_matches),
        })
    }

    /// Answer a legal question. Always returns a complete answer string.
    pub fn ask(&self, question: &str) -> String {
        self.composer.compose(question)
    }
}
