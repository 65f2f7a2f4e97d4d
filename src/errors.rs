//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the retrieval engine, providing structured
//! error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from storage, ingestion, indexing and search
//! - **Output**: Structured error types with context
//! - **Error Categories**: Storage, Ingestion, Index, Embedding, Config
//!
//! ## Key Features
//! - One error enum for the whole crate with detailed context
//! - Automatic conversion from library error types
//! - Category accessor for structured logging

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, KanoonError>;

/// Error types for the retrieval engine
#[derive(Debug, Error)]
pub enum KanoonError {
    /// Document lookup by id yielded nothing where a row was required
    #[error("Document {doc_id} not found")]
    NotFound { doc_id: i64 },

    /// A search index structure or its backing library is missing
    #[error("Index '{index}' unavailable: {reason}")]
    IndexUnavailable { index: String, reason: String },

    /// An ingestion source file does not parse or has an unsupported shape
    #[error("Malformed source file {file}: {details}")]
    MalformedSource { file: String, details: String },

    /// Embedding model loading or inference failure
    #[error("Embedding failure: {details}")]
    Embedding { details: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Underlying SQLite errors
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary serialization errors (vector index file)
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl KanoonError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            KanoonError::NotFound { .. } | KanoonError::Storage(_) => "storage",
            KanoonError::MalformedSource { .. } => "ingestion",
            KanoonError::IndexUnavailable { .. } => "index",
            KanoonError::Embedding { .. } | KanoonError::Serialization(_) => "embedding",
            KanoonError::Config { .. } => "configuration",
            KanoonError::ValidationFailed { .. } => "validation",
            KanoonError::Io(_) | KanoonError::Internal { .. } => "system",
        }
    }

    /// True when the failing tier can be skipped and the next tier tried
    pub fn is_tier_recoverable(&self) -> bool {
        matches!(
            self,
            KanoonError::IndexUnavailable { .. } | KanoonError::Embedding { .. }
        )
    }
}
