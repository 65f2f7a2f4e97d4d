//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the retrieval engine, loaded from a TOML
//! file with environment-variable overrides and validation.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`KANOON_*`)
//! 2. Configuration file
//! 3. Default values

use crate::errors::{KanoonError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store settings
    pub storage: StorageConfig,
    /// Corpus ingestion settings
    pub ingestion: IngestionConfig,
    /// Embedding model and vector index settings
    pub embedding: EmbeddingConfig,
    /// Tiered retrieval behavior
    pub retrieval: RetrievalConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file path
    pub db_path: PathBuf,
    /// Maintain the FTS5 mirror of (title, content). When disabled the
    /// lexical tier degrades to substring containment.
    pub enable_fts: bool,
    /// Maximum accepted title length in bytes
    pub max_title_len: usize,
    /// Maximum accepted content length in bytes
    pub max_content_len: usize,
}

/// Corpus ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Directory scanned for `*.json` source files
    pub data_dir: PathBuf,
}

/// Embedding model and vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Sentence embedding model identifier
    pub model_name: String,
    /// Vector dimension (must match the model output width)
    pub dimension: usize,
    /// Local cache directory for model files
    pub model_cache_dir: PathBuf,
    /// Persisted vector index file path
    pub index_path: PathBuf,
    /// Batch size for offline embedding generation
    pub batch_size: usize,
}

/// Tiered retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of results requested from the lexical and semantic tiers
    pub default_top_k: usize,
    /// Result cap for the reference-resolution tier
    pub reference_max_results: usize,
    /// Maximum matches rendered into a composed answer
    pub max_rendered_matches: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit structured JSON log lines
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a specific file, falling back to defaults
    /// when the file does not exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| KanoonError::Config {
                message: format!("Failed to read config file {:?}: {}", path, e),
            })?;
            toml::from_str(&content).map_err(|e| KanoonError::Config {
                message: format!("Failed to parse config file {:?}: {}", path, e),
            })?
        } else {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(db_path) = std::env::var("KANOON_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(data_dir) = std::env::var("KANOON_DATA_DIR") {
            self.ingestion.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(index_path) = std::env::var("KANOON_INDEX_PATH") {
            self.embedding.index_path = PathBuf::from(index_path);
        }
        if let Ok(level) = std::env::var("KANOON_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(KanoonError::ValidationFailed {
                field: "embedding.dimension".to_string(),
                reason: "Vector dimension must be greater than zero".to_string(),
            });
        }
        if self.embedding.batch_size == 0 {
            return Err(KanoonError::ValidationFailed {
                field: "embedding.batch_size".to_string(),
                reason: "Batch size must be greater than zero".to_string(),
            });
        }
        if self.retrieval.default_top_k == 0 {
            return Err(KanoonError::ValidationFailed {
                field: "retrieval.default_top_k".to_string(),
                reason: "top_k must be greater than zero".to_string(),
            });
        }
        if self.retrieval.reference_max_results == 0 {
            return Err(KanoonError::ValidationFailed {
                field: "retrieval.reference_max_results".to_string(),
                reason: "Reference tier result cap must be greater than zero".to_string(),
            });
        }
        if self.storage.max_title_len == 0 || self.storage.max_content_len == 0 {
            return Err(KanoonError::ValidationFailed {
                field: "storage.max_title_len".to_string(),
                reason: "Length limits must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ingestion: IngestionConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/legal_docs.db"),
            enable_fts: true,
            max_title_len: 1_024,
            max_content_len: 1_000_000,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            model_cache_dir: PathBuf::from("./models"),
            index_path: PathBuf::from("./data/embeddings.bin"),
            batch_size: 64,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            reference_max_results: 5,
            max_rendered_matches: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::from_file("/nonexistent/kanoon.toml").unwrap();
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.retrieval.default_top_k, 3);
        assert!(config.storage.enable_fts);
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[retrieval]\ndefault_top_k = 5\n\n[logging]\nlevel = \"debug\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.retrieval.default_top_k, 5);
        assert_eq!(config.logging.level, "debug");
        // untouched sections fall back to defaults
        assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
    }

    #[test]
    fn zero_dimension_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[embedding]\ndimension = 0\n").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
