//! # Ingestion Module
//!
//! ## Purpose
//! Loads the legal corpus from raw JSON source files into the document
//! store. Each `*.json` file in the data directory is parsed best-effort: a
//! file that fails to parse or extract is skipped with a warning while the
//! run continues. The final corpus is installed atomically via
//! [`DocumentStore::replace_all`], so a failed run never leaves a partial
//! corpus behind.
//!
//! ## Input/Output Specification
//! - **Input**: A data directory of JSON corpus files
//! - **Output**: A fully replaced `documents` table plus run statistics

pub mod extract;

use crate::errors::{KanoonError, Result};
use crate::store::DocumentStore;
use crate::DocumentEntry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub documents_inserted: usize,
}

/// Loads JSON corpus files and replaces the stored document set
pub struct IngestionPipeline {
    store: Arc<DocumentStore>,
    data_dir: PathBuf,
}

impl IngestionPipeline {
    pub fn new(store: Arc<DocumentStore>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
        }
    }

    /// Run a full ingestion pass over the data directory.
    ///
    /// Files are processed in filename order so repeated runs over the same
    /// corpus assign identical document ids. Extracting zero documents
    /// overall aborts the run without touching the store.
    pub fn run(&self) -> Result<IngestStats> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json")
            })
            .collect();
        files.sort();

        let mut stats = IngestStats::default();
        let mut entries: Vec<DocumentEntry> = Vec::new();

        for path in &files {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("<unknown>")
                .to_string();

            match self.load_file(path, &file_name) {
                Ok(extracted) => {
                    info!(file = %file_name, documents = extracted.len(), "Extracted corpus file");
                    entries.extend(extracted);
                    stats.files_loaded += 1;
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Skipping unreadable corpus file");
                    stats.files_skipped += 1;
                }
            }
        }

        if entries.is_empty() {
            return Err(KanoonError::Internal {
                message: format!(
                    "No documents extracted from {}; store left untouched",
                    self.data_dir.display()
                ),
            });
        }

        self.store.replace_all(&entries)?;
        stats.documents_inserted = entries.len();

        info!(
            files_loaded = stats.files_loaded,
            files_skipped = stats.files_skipped,
            documents = stats.documents_inserted,
            "Ingestion complete; rebuild the vector index to pick up changes"
        );
        Ok(stats)
    }

    fn load_file(&self, path: &std::path::Path, file_name: &str) -> Result<Vec<DocumentEntry>> {
        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| KanoonError::MalformedSource {
                file: file_name.to_string(),
                details: e.to_string(),
            })?;
        extract::extract_entries(&value, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::store::DocumentStore;
    use std::fs;

    fn write_file(dir: &std::path::Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn ingests_all_json_files_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "a_coi.json",
            r#"{"Article 21": "Protection of life and personal liberty."}"#,
        );
        write_file(
            dir.path(),
            "b_ipc.json",
            r#"[{"Section": "302", "ClauseDesc": "Punishment for murder."}]"#,
        );

        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        let stats = IngestionPipeline::new(store.clone(), dir.path()).run().unwrap();

        assert_eq!(stats.files_loaded, 2);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.documents_inserted, 2);

        let docs = store.list_all().unwrap();
        assert_eq!(docs[0].title, "Article 21");
        assert_eq!(docs[0].source, "a_coi.json");
        assert_eq!(docs[1].title, "302");
    }

    #[test]
    fn malformed_file_is_skipped_without_aborting_the_run() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.json", "{ not json at all");
        write_file(dir.path(), "wrong_shape.json", "42");
        write_file(
            dir.path(),
            "good.json",
            r#"{"Article 14": "Equality before law."}"#,
        );

        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        let stats = IngestionPipeline::new(store.clone(), dir.path()).run().unwrap();

        assert_eq!(stats.files_loaded, 1);
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn empty_extraction_leaves_existing_corpus_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "broken.json", "not json");

        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        store
            .replace_all(&[DocumentEntry {
                title: "Article 21".to_string(),
                content: "Protection of life.".to_string(),
                source: "seed.json".to_string(),
            }])
            .unwrap();

        let err = IngestionPipeline::new(store.clone(), dir.path()).run().unwrap_err();
        assert_eq!(err.category(), "system");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "readme.txt", "not a corpus file");
        write_file(
            dir.path(),
            "coi.json",
            r#"{"Article 21": "Protection of life."}"#,
        );

        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        let stats = IngestionPipeline::new(store, dir.path()).run().unwrap();
        assert_eq!(stats.files_loaded, 1);
        assert_eq!(stats.files_skipped, 0);
    }
}
