//! # Document Store Module
//!
//! ## Purpose
//! Persistent storage for legal provisions backed by SQLite, with an FTS5
//! mirror of (title, content) maintained in lockstep with the documents
//! table for the lexical search tier.
//!
//! ## Input/Output Specification
//! - **Input**: Ingested (title, content, source) entries, id lookups
//! - **Output**: Documents ordered by id, title/full-text query results
//! - **Storage**: `documents(id, title, content, source)` + `documents_fts`
//!
//! ## Key Features
//! - Transactional full replace: either the new corpus is fully visible or
//!   the prior one is untouched
//! - FTS5 external-content mirror rebuilt inside the same transaction
//! - Graceful degradation when FTS5 is unavailable
//! - Length validation of incoming entries

use crate::config::StorageConfig;
use crate::errors::{KanoonError, Result};
use crate::{Document, DocumentEntry, Hit};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

/// Persisted collection of legal provisions
pub struct DocumentStore {
    conn: Mutex<Connection>,
    fts_enabled: bool,
    max_title_len: usize,
    max_content_len: usize,
}

impl DocumentStore {
    /// Open or create the store at the configured path
    pub fn open(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.db_path)?;
        Self::with_connection(conn, config)
    }

    /// Create an in-memory store (used by tests and ad-hoc tooling)
    pub fn in_memory(config: &StorageConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, config)
    }

    fn with_connection(conn: Connection, config: &StorageConfig) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL
            )",
            [],
        )?;

        let fts_enabled = if config.enable_fts {
            match conn.execute(
                "CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
                    title, content, content='documents', content_rowid='id'
                )",
                [],
            ) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("FTS5 unavailable, lexical tier degrades to substring scan: {}", e);
                    false
                }
            }
        } else {
            false
        };

        tracing::info!(fts_enabled, "Document store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            fts_enabled,
            max_title_len: config.max_title_len,
            max_content_len: config.max_content_len,
        })
    }

    /// Whether the FTS5 mirror is being maintained
    pub fn fts_enabled(&self) -> bool {
        self.fts_enabled
    }

    /// Fetch a document by id
    pub fn get(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let doc = conn
            .query_row(
                "SELECT id, title, content, source FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Document {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        source: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(doc)
    }

    /// All documents ordered by ascending id
    pub fn list_all(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, title, content, source FROM documents ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Document {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                source: row.get(3)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }

    /// All document ids in ascending order. This is the ordering the vector
    /// index rows are positionally joined against.
    pub fn list_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM documents ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Replace the entire corpus in one transaction.
    ///
    /// On any failure the transaction rolls back and the prior documents and
    /// their FTS mirror stay visible to readers. Returns the inserted count.
    pub fn replace_all(&self, entries: &[DocumentEntry]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM documents", [])?;
        if self.fts_enabled {
            tx.execute(
                "INSERT INTO documents_fts(documents_fts) VALUES('delete-all')",
                [],
            )?;
        }

        let mut inserted = 0usize;
        for entry in entries {
            self.validate_entry(entry)?;
            tx.execute(
                "INSERT INTO documents (title, content, source) VALUES (?1, ?2, ?3)",
                params![entry.title, entry.content, entry.source],
            )?;
            if self.fts_enabled {
                let id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO documents_fts(rowid, title, content) VALUES (?1, ?2, ?3)",
                    params![id, entry.title, entry.content],
                )?;
            }
            inserted += 1;
        }

        tx.commit()?;
        tracing::info!(inserted, "Replaced document corpus");
        Ok(inserted)
    }

    fn validate_entry(&self, entry: &DocumentEntry) -> Result<()> {
        if entry.title.len() > self.max_title_len {
            return Err(KanoonError::ValidationFailed {
                field: "title".to_string(),
                reason: format!(
                    "{} bytes exceeds limit of {}",
                    entry.title.len(),
                    self.max_title_len
                ),
            });
        }
        if entry.content.len() > self.max_content_len {
            return Err(KanoonError::ValidationFailed {
                field: "content".to_string(),
                reason: format!(
                    "{} bytes exceeds limit of {}",
                    entry.content.len(),
                    self.max_content_len
                ),
            });
        }
        Ok(())
    }

    /// Documents whose lowercased title contains `token` (already lowercase)
    pub fn find_title_contains(&self, token: &str, limit: usize) -> Result<Vec<Hit>> {
        let pattern = format!("%{}%", token);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT title, content FROM documents WHERE lower(title) LIKE ?1 LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(Hit {
                title: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }

    /// Documents whose lowercased title equals `normalized`
    pub fn find_title_exact(&self, normalized: &str, limit: usize) -> Result<Vec<Hit>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT title, content FROM documents WHERE lower(title) = ?1 LIMIT ?2")?;
        let rows = stmt.query_map(params![normalized, limit as i64], |row| {
            Ok(Hit {
                title: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }

    /// Token-match query against the FTS5 mirror, best rank first
    pub fn match_fulltext(&self, fts_query: &str, limit: usize) -> Result<Vec<Hit>> {
        if !self.fts_enabled {
            return Err(KanoonError::IndexUnavailable {
                index: "lexical".to_string(),
                reason: "FTS5 mirror not maintained".to_string(),
            });
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT title, content FROM documents_fts
             WHERE documents_fts MATCH ?1 ORDER BY rank LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_query, limit as i64], |row| {
            Ok(Hit {
                title: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }

    /// Case-insensitive substring containment over title OR content, in
    /// store insertion order. The lexical tier's fallback path.
    pub fn scan_substring(&self, query: &str, limit: usize) -> Result<Vec<Hit>> {
        let pattern = format!("%{}%", query);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT title, content FROM documents
             WHERE title LIKE ?1 OR content LIKE ?1 ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(Hit {
                title: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(KanoonError::from)
    }
}
