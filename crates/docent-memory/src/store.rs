use async_trait::async_trait;
use docent_core::{DocentError, DocentResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the single persisted collection.
pub const COLLECTION: &str = "documents";

/// One indexed chunk of the active document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Id of the chunk this entry indexes.
    pub chunk_id: Uuid,
    /// Position of the chunk in its document.
    pub ordinal: usize,
    /// Char offset of the chunk in its document.
    pub offset: usize,
    /// Chunk text.
    pub content: String,
    /// Chunk vector.
    pub embedding: Vec<f32>,
}

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matching entry.
    pub entry: IndexEntry,
    /// Cosine distance, `1 - similarity`. Smaller is closer.
    pub distance: f32,
}

/// Trait for vector storage backends.
///
/// A store holds exactly one collection. `replace` swaps it wholesale so a
/// reader never observes a mix of two documents.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace every entry with `entries`.
    async fn replace(&self, entries: Vec<IndexEntry>) -> DocentResult<()>;

    /// The `top_k` entries closest to `query`, nearest first, ties by ordinal.
    async fn search(&self, query: &[f32], top_k: usize) -> DocentResult<Vec<SearchHit>>;

    /// Remove every entry. Idempotent.
    async fn clear(&self) -> DocentResult<()>;

    /// Count entries.
    async fn count(&self) -> DocentResult<usize>;

    /// All entries in ordinal order.
    async fn list(&self) -> DocentResult<Vec<IndexEntry>>;
}

/// In-memory vector store using brute-force cosine similarity.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn with_entries(entries: Vec<IndexEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn replace(&self, mut entries: Vec<IndexEntry>) -> DocentResult<()> {
        entries.sort_by_key(|e| e.ordinal);
        *self.entries.write().await = entries;
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> DocentResult<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().await;
        let mut hits: Vec<SearchHit> = entries
            .iter()
            .map(|e| SearchHit {
                distance: 1.0 - cosine_similarity(query, &e.embedding),
                entry: e.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.entry.ordinal.cmp(&b.entry.ordinal))
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn clear(&self) -> DocentResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> DocentResult<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn list(&self) -> DocentResult<Vec<IndexEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

/// File-backed vector store that persists the collection as JSONL on disk.
/// Loads the collection into memory on open; `replace` deletes and recreates
/// the file, `clear` deletes it.
pub struct FileVectorStore {
    path: PathBuf,
    inner: InMemoryVectorStore,
}

impl FileVectorStore {
    /// Open the collection under `dir`, loading it if present.
    pub async fn open(dir: impl AsRef<Path>) -> DocentResult<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DocentError::Storage(format!("Failed to create dir: {e}")))?;

        let path = dir.join(format!("{COLLECTION}.jsonl"));
        let mut entries = Vec::new();
        if tokio::fs::try_exists(&path).await? {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| DocentError::Storage(format!("Failed to read vector store: {e}")))?;
            for line in data.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: IndexEntry = serde_json::from_str(line)
                    .map_err(|e| DocentError::Storage(format!("Invalid JSONL entry: {e}")))?;
                entries.push(entry);
            }
            entries.sort_by_key(|e| e.ordinal);
        }

        Ok(Self {
            path,
            inner: InMemoryVectorStore::with_entries(entries),
        })
    }

    /// Path of the JSONL collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn remove_file(&self) -> DocentResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DocentError::Storage(format!(
                "Failed to delete collection: {e}"
            ))),
        }
    }

    async fn write_file(&self, entries: &[IndexEntry]) -> DocentResult<()> {
        let mut data = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| DocentError::Storage(format!("Failed to serialize entry: {e}")))?;
            data.push_str(&line);
            data.push('\n');
        }
        tokio::fs::write(&self.path, data.as_bytes())
            .await
            .map_err(|e| DocentError::Storage(format!("Failed to write vector store: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn replace(&self, mut entries: Vec<IndexEntry>) -> DocentResult<()> {
        entries.sort_by_key(|e| e.ordinal);
        self.remove_file().await?;
        self.write_file(&entries).await?;
        self.inner.replace(entries).await
    }

    async fn search(&self, query: &[f32], top_k: usize) -> DocentResult<Vec<SearchHit>> {
        self.inner.search(query, top_k).await
    }

    async fn clear(&self) -> DocentResult<()> {
        self.remove_file().await?;
        self.inner.clear().await
    }

    async fn count(&self) -> DocentResult<usize> {
        self.inner.count().await
    }

    async fn list(&self) -> DocentResult<Vec<IndexEntry>> {
        self.inner.list().await
    }
}

/// Cosine similarity between two vectors. Zero when either is all zeros or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
