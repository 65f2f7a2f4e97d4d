//! # Vector Search Module
//!
//! ## Purpose
//! Dense semantic search over L2-normalized sentence embeddings of every
//! document. The index is a flat file of f32 vectors built offline in
//! document-id order; at query time the query is encoded with the same
//! model and scored by inner product (= cosine similarity on unit vectors).
//!
//! ## Input/Output Specification
//! - **Input**: Free-text query, persisted vector file, embedding model
//! - **Output**: Most similar documents, score descending
//! - **Model**: all-MiniLM-L6-v2 via fastembed (384 dimensions)
//!
//! ## Key Features
//! - Positional join: row *i* of the vector file corresponds to the *i*-th
//!   document ordered by ascending id at build time. The row count is
//!   checked against the live store on every search; a mismatch disables
//!   the tier (empty result) instead of silently returning wrong documents.
//! - Lazy one-time loading of both the model and the vector file
//! - Missing index file is not an error: the tier is best-effort

use crate::config::EmbeddingConfig;
use crate::errors::{KanoonError, Result};
use crate::retrieval::SearchTier;
use crate::store::DocumentStore;
use crate::Hit;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Sentence-embedding backend. The production implementation wraps
/// fastembed; tests substitute a deterministic stub.
pub trait Embedder: Send + Sync {
    /// Output vector width
    fn dimension(&self) -> usize;

    /// Encode a batch of texts into raw (not yet normalized) vectors
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// fastembed-backed embedder, model loaded on first use behind a mutex so
/// concurrent callers cannot race duplicate loads
pub struct FastEmbedder {
    config: EmbeddingConfig,
    model: Mutex<Option<TextEmbedding>>,
}

impl FastEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            model: Mutex::new(None),
        }
    }

    fn model_id(&self) -> Result<EmbeddingModel> {
        match self.config.model_name.as_str() {
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            other => Err(KanoonError::Config {
                message: format!("Unsupported embedding model: {}", other),
            }),
        }
    }
}

impl Embedder for FastEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut guard = self.model.lock();
        if guard.is_none() {
            tracing::info!(model = %self.config.model_name, "Loading embedding model");
            let options = InitOptions::new(self.model_id()?)
                .with_cache_dir(self.config.model_cache_dir.clone())
                .with_show_download_progress(false);
            let model = TextEmbedding::try_new(options).map_err(|e| KanoonError::Embedding {
                details: format!("Failed to load {}: {}", self.config.model_name, e),
            })?;
            *guard = Some(model);
        }

        let model = guard.as_mut().expect("model initialized above");
        model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| KanoonError::Embedding {
                details: e.to_string(),
            })
    }
}

/// Scale a vector to unit length. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// On-disk vector index: dimension header plus row-major f32 vectors, row
/// order = document id ascending at build time
#[derive(Debug, Serialize, Deserialize)]
struct VectorFile {
    dimension: u32,
    vectors: Vec<f32>,
}

/// Loaded, read-only vector set
struct VectorSet {
    dimension: usize,
    vectors: Vec<f32>,
}

impl VectorSet {
    fn rows(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dimension..(i + 1) * self.dimension]
    }
}

/// Build the vector index for every document in id order and persist it.
///
/// Embeds `title + "\n\n" + content`, L2-normalizes each vector, and writes
/// the flat file the query path consumes. Returns the number of rows.
pub fn build_index(
    store: &DocumentStore,
    embedder: &dyn Embedder,
    path: &Path,
    batch_size: usize,
) -> Result<usize> {
    let docs = store.list_all()?;
    let dim = embedder.dimension();
    let mut vectors: Vec<f32> = Vec::with_capacity(docs.len() * dim);

    for batch in docs.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch
            .iter()
            .map(|d| format!("{}\n\n{}", d.title, d.content))
            .collect();
        for mut v in embedder.embed(&texts)? {
            if v.len() != dim {
                return Err(KanoonError::Embedding {
                    details: format!("Model produced {}-dim vector, expected {}", v.len(), dim),
                });
            }
            l2_normalize(&mut v);
            vectors.extend_from_slice(&v);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    bincode::serialize_into(
        BufWriter::new(file),
        &VectorFile {
            dimension: dim as u32,
            vectors,
        },
    )?;

    tracing::info!(rows = docs.len(), dim, path = %path.display(), "Vector index written");
    Ok(docs.len())
}

/// Semantic search tier over the persisted vector file
pub struct VectorIndex {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
    index_path: PathBuf,
    loaded: OnceLock<Option<VectorSet>>,
}

impl VectorIndex {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<dyn Embedder>, index_path: PathBuf) -> Self {
        Self {
            store,
            embedder,
            index_path,
            loaded: OnceLock::new(),
        }
    }

    /// Load the vector file once per process. Absence or corruption leaves
    /// the tier disabled rather than failing the query.
    fn vector_set(&self) -> Option<&VectorSet> {
        self.loaded
            .get_or_init(|| {
                if !self.index_path.exists() {
                    tracing::debug!(path = %self.index_path.display(), "No vector index file, semantic tier disabled");
                    return None;
                }
                match std::fs::File::open(&self.index_path)
                    .map_err(KanoonError::from)
                    .and_then(|f| {
                        bincode::deserialize_from::<_, VectorFile>(BufReader::new(f))
                            .map_err(KanoonError::from)
                    }) {
                    Ok(file) => {
                        let set = VectorSet {
                            dimension: file.dimension as usize,
                            vectors: file.vectors,
                        };
                        if set.dimension != self.embedder.dimension() {
                            tracing::warn!(
                                file_dim = set.dimension,
                                model_dim = self.embedder.dimension(),
                                "Vector index dimension differs from model, semantic tier disabled"
                            );
                            return None;
                        }
                        tracing::info!(rows = set.rows(), dim = set.dimension, "Vector index loaded");
                        Some(set)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to load vector index, semantic tier disabled");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Most similar documents, score descending. Returns hits with their
    /// cosine similarity in [-1, 1].
    pub fn search_scored(&self, query: &str, top_k: usize) -> Result<Vec<(Hit, f32)>> {
        let Some(set) = self.vector_set() else {
            return Ok(Vec::new());
        };
        if set.rows() == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        // Positional join invariant: the file must describe exactly the
        // documents currently in the store, in id order.
        let ids = self.store.list_ids()?;
        if ids.len() != set.rows() {
            tracing::warn!(
                index_rows = set.rows(),
                store_docs = ids.len(),
                "Vector index out of sync with document store, semantic tier disabled"
            );
            return Ok(Vec::new());
        }

        let mut query_vec = self
            .embedder
            .embed(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| KanoonError::Embedding {
                details: "Model returned no vector for query".to_string(),
            })?;
        if query_vec.len() != set.dimension {
            return Err(KanoonError::Embedding {
                details: format!(
                    "Query vector is {}-dim, index is {}-dim",
                    query_vec.len(),
                    set.dimension
                ),
            });
        }
        l2_normalize(&mut query_vec);

        let mut scored: Vec<(usize, f32)> = (0..set.rows())
            .map(|i| {
                let dot = set
                    .row(i)
                    .iter()
                    .zip(query_vec.iter())
                    .map(|(a, b)| a * b)
                    .sum::<f32>();
                (i, dot)
            })
            .collect();
        // score descending, position ascending for deterministic ties
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        let mut hits = Vec::with_capacity(scored.len());
        for (pos, score) in scored {
            let doc = self
                .store
                .get(ids[pos])?
                .ok_or(KanoonError::NotFound { doc_id: ids[pos] })?;
            hits.push((
                Hit {
                    title: doc.title,
                    content: doc.content,
                },
                score,
            ));
        }
        Ok(hits)
    }
}

impl SearchTier for VectorIndex {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        Ok(self
            .search_scored(query, top_k)?
            .into_iter()
            .map(|(hit, _)| hit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::text::tokenize_words;
    use crate::DocumentEntry;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    /// Deterministic bag-of-words embedder: tokens hashed into buckets
    struct StubEmbedder {
        dimension: usize,
    }

    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            self.dimension
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; self.dimension];
                    for token in tokenize_words(&text.to_lowercase()) {
                        let mut hasher = DefaultHasher::new();
                        token.hash(&mut hasher);
                        v[(hasher.finish() as usize) % self.dimension] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    fn entries() -> Vec<DocumentEntry> {
        vec![
            DocumentEntry {
                title: "Article 21".to_string(),
                content: "Protection of life and personal liberty".to_string(),
                source: "COI.json".to_string(),
            },
            DocumentEntry {
                title: "Section 302".to_string(),
                content: "Punishment for murder death imprisonment fine".to_string(),
                source: "IPC.json".to_string(),
            },
            DocumentEntry {
                title: "Section 378".to_string(),
                content: "Theft movable property dishonest taking".to_string(),
                source: "IPC.json".to_string(),
            },
        ]
    }

    fn built_index(dir: &Path) -> (Arc<DocumentStore>, PathBuf) {
        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        store.replace_all(&entries()).unwrap();
        let path = dir.join("embeddings.bin");
        let embedder = StubEmbedder { dimension: 64 };
        let rows = build_index(store.as_ref(), &embedder, &path, 2).unwrap();
        assert_eq!(rows, 3);
        (store, path)
    }

    #[test]
    fn self_similarity_ranks_first_with_unit_score() {
        let dir = tempfile::tempdir().unwrap();
        let (store, path) = built_index(dir.path());
        let index = VectorIndex::new(store.clone(), Arc::new(StubEmbedder { dimension: 64 }), path);

        let doc = store.list_all().unwrap().remove(1);
        let query = format!("{}\n\n{}", doc.title, doc.content);
        let hits = index.search_scored(&query, 3).unwrap();

        assert_eq!(hits[0].0.title, "Section 302");
        assert!((hits[0].1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let (store, path) = built_index(dir.path());
        let index = VectorIndex::new(store, Arc::new(StubEmbedder { dimension: 64 }), path);

        let first = index.search_scored("murder punishment", 3).unwrap();
        let second = index.search_scored("murder punishment", 3).unwrap();
        let titles = |hits: &[(Hit, f32)]| {
            hits.iter().map(|(h, _)| h.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&first), titles(&second));
        assert!(!first.is_empty());
    }

    #[test]
    fn missing_index_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::in_memory(&StorageConfig::default()).unwrap());
        store.replace_all(&entries()).unwrap();
        let index = VectorIndex::new(
            store,
            Arc::new(StubEmbedder { dimension: 64 }),
            dir.path().join("missing.bin"),
        );
        assert!(index.search_scored("murder", 3).unwrap().is_empty());
    }

    #[test]
    fn row_count_mismatch_disables_tier() {
        let dir = tempfile::tempdir().unwrap();
        let (store, path) = built_index(dir.path());

        // corpus changes after the index was built: positional join is broken
        store
            .replace_all(&entries()[..2].to_vec())
            .unwrap();

        let index = VectorIndex::new(store, Arc::new(StubEmbedder { dimension: 64 }), path);
        assert!(index.search_scored("murder", 3).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_disables_tier() {
        let dir = tempfile::tempdir().unwrap();
        let (store, path) = built_index(dir.path());
        let index = VectorIndex::new(store, Arc::new(StubEmbedder { dimension: 32 }), path);
        assert!(index.search_scored("murder", 3).unwrap().is_empty());
    }

    #[test]
    fn normalize_handles_zero_vector() {
        let mut v = vec![0.0f32; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0f32; 4]);

        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }
}
