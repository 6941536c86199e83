use crate::chunker::Chunk;
use crate::store::{IndexEntry, SearchHit, VectorStore};
use chrono::{DateTime, Utc};
use docent_core::{DocentError, DocentResult};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Name recorded for a collection reloaded from disk.
const RESTORED_NAME: &str = "restored document";

/// The single document currently backing the index.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    /// Fresh per ingestion.
    pub id: Uuid,
    /// Uploaded file name.
    pub name: String,
    /// Length of the extracted text, in chars.
    pub char_count: usize,
    /// Chunks in ordinal order.
    pub chunks: Arc<[Chunk]>,
    /// When ingestion finished.
    pub loaded_at: DateTime<Utc>,
}

/// Public snapshot of the loaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatus {
    /// Id of the loaded document, fresh per ingestion.
    pub document_id: Uuid,
    /// Uploaded file name.
    pub name: String,
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// Length of the extracted text, in chars.
    pub char_count: usize,
    /// When ingestion finished.
    pub loaded_at: DateTime<Utc>,
}

impl From<&ActiveDocument> for DocumentStatus {
    fn from(doc: &ActiveDocument) -> Self {
        Self {
            document_id: doc.id,
            name: doc.name.clone(),
            chunk_count: doc.chunks.len(),
            char_count: doc.char_count,
            loaded_at: doc.loaded_at,
        }
    }
}

/// Whether a document is available for retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexState {
    /// No document loaded.
    NotReady,
    /// A document is loaded and searchable.
    Ready(DocumentStatus),
}

impl IndexState {
    /// Whether a document is loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self, IndexState::Ready(_))
    }
}

/// Lifecycle owner of the vector index for the active document.
///
/// The active-document marker and the backing store are guarded by one
/// reader/writer lock: `replace` and `clear` take it for writing, queries for
/// reading, so a query sees either the old index or the new one.
pub struct DocumentIndex {
    active: RwLock<Option<ActiveDocument>>,
    store: Arc<dyn VectorStore>,
    dimension: usize,
}

impl DocumentIndex {
    /// Wrap an empty (or about to be cleared) store.
    pub fn new(store: Arc<dyn VectorStore>, dimension: usize) -> Self {
        Self {
            active: RwLock::new(None),
            store,
            dimension,
        }
    }

    /// Wrap a store that may already hold a persisted collection and mark it
    /// active when its entries have the expected dimension.
    pub async fn open(store: Arc<dyn VectorStore>, dimension: usize) -> DocentResult<Self> {
        let entries = store.list().await?;
        if entries.is_empty() {
            return Ok(Self::new(store, dimension));
        }

        if entries.iter().any(|e| e.embedding.len() != dimension) {
            info!("Persisted collection has a different dimension, discarding it");
            store.clear().await?;
            return Ok(Self::new(store, dimension));
        }

        let chunks: Vec<Chunk> = entries
            .iter()
            .map(|e| Chunk {
                id: e.chunk_id,
                text: e.content.clone(),
                index: e.ordinal,
                offset: e.offset,
            })
            .collect();
        let char_count = chunks
            .last()
            .map(|c| c.offset + c.char_len())
            .unwrap_or_default();

        info!(chunks = chunks.len(), "Restored persisted document index");
        let active = ActiveDocument {
            id: Uuid::new_v4(),
            name: RESTORED_NAME.to_string(),
            char_count,
            chunks: chunks.into(),
            loaded_at: Utc::now(),
        };

        Ok(Self {
            active: RwLock::new(Some(active)),
            store,
            dimension,
        })
    }

    /// Expected embedding width.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Install `chunks` of `name` as the only indexed document.
    ///
    /// Fails with `DimensionMismatch` and leaves the previous index in place
    /// when the counts disagree or any embedding has the wrong width.
    pub async fn replace(
        &self,
        name: &str,
        char_count: usize,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> DocentResult<DocumentStatus> {
        if chunks.len() != embeddings.len() {
            return Err(DocentError::DimensionMismatch(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(DocentError::DimensionMismatch(format!(
                "expected {}, got {}",
                self.dimension,
                bad.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                chunk_id: chunk.id,
                ordinal: chunk.index,
                offset: chunk.offset,
                content: chunk.text.clone(),
                embedding,
            })
            .collect();

        let mut active = self.active.write().await;
        self.store.replace(entries).await?;

        let doc = ActiveDocument {
            id: Uuid::new_v4(),
            name: name.to_string(),
            char_count,
            chunks: chunks.into(),
            loaded_at: Utc::now(),
        };
        let status = DocumentStatus::from(&doc);
        *active = Some(doc);

        info!(
            document_id = %status.document_id,
            name = %status.name,
            chunks = status.chunk_count,
            "Document index replaced"
        );
        Ok(status)
    }

    /// Texts of the `k` chunks nearest to `embedding`.
    pub async fn query(&self, embedding: &[f32], k: usize) -> DocentResult<Vec<String>> {
        let hits = self.search(embedding, k).await?;
        Ok(hits.into_iter().map(|h| h.entry.content).collect())
    }

    /// The `k` nearest entries with their distances. Empty when nothing is
    /// loaded or `k == 0`.
    pub async fn search(&self, embedding: &[f32], k: usize) -> DocentResult<Vec<SearchHit>> {
        let active = self.active.read().await;
        if active.is_none() || k == 0 {
            return Ok(Vec::new());
        }
        self.store.search(embedding, k).await
    }

    /// Drop the active document. Idempotent.
    pub async fn clear(&self) -> DocentResult<()> {
        let mut active = self.active.write().await;
        self.store.clear().await?;
        if let Some(doc) = active.take() {
            info!(document_id = %doc.id, "Document index cleared");
        }
        Ok(())
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> IndexState {
        match self.active.read().await.as_ref() {
            Some(doc) => IndexState::Ready(DocumentStatus::from(doc)),
            None => IndexState::NotReady,
        }
    }

    /// A uniformly random chunk of the active document.
    pub async fn random_chunk(&self) -> Option<Chunk> {
        let active = self.active.read().await;
        let doc = active.as_ref()?;
        doc.chunks.choose(&mut rand::thread_rng()).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::store::{FileVectorStore, InMemoryVectorStore};

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot % dim] = 1.0;
        v
    }

    fn index(dim: usize) -> DocumentIndex {
        DocumentIndex::new(Arc::new(InMemoryVectorStore::new()), dim)
    }

    fn chunks(text: &str) -> Vec<Chunk> {
        Chunker::new(10, 0).chunk(text)
    }

    #[tokio::test]
    async fn test_starts_not_ready() {
        let idx = index(4);
        assert_eq!(idx.state().await, IndexState::NotReady);
        assert!(idx.query(&unit(4, 0), 3).await.unwrap().is_empty());
        assert!(idx.random_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_replace_then_query() {
        let idx = index(4);
        let cs = chunks("aaaaaaaaaabbbbbbbbbbcccccccccc");
        let embs = (0..cs.len()).map(|i| unit(4, i)).collect();
        let status = idx.replace("abc.txt", 30, cs, embs).await.unwrap();
        assert_eq!(status.chunk_count, 3);
        assert_eq!(status.name, "abc.txt");

        let texts = idx.query(&unit(4, 1), 1).await.unwrap();
        assert_eq!(texts, vec!["bbbbbbbbbb"]);
        assert!(idx.state().await.is_ready());
        assert!(idx.query(&unit(4, 1), 0).await.unwrap().is_empty());
        assert_eq!(idx.query(&unit(4, 1), 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replace_rejects_count_mismatch() {
        let idx = index(4);
        let cs = chunks("aaaaaaaaaabbbbbbbbbb");
        let err = idx.replace("x", 20, cs, vec![unit(4, 0)]).await.unwrap_err();
        assert!(matches!(err, DocentError::DimensionMismatch(_)));
        assert_eq!(idx.state().await, IndexState::NotReady);
    }

    #[tokio::test]
    async fn test_replace_rejects_wrong_width_keeps_previous() {
        let idx = index(4);
        let first = chunks("aaaaaaaaaa");
        idx.replace("first", 10, first, vec![unit(4, 0)]).await.unwrap();

        let second = chunks("bbbbbbbbbb");
        let err = idx.replace("second", 10, second, vec![vec![1.0; 3]]).await.unwrap_err();
        assert!(matches!(err, DocentError::DimensionMismatch(_)));

        match idx.state().await {
            IndexState::Ready(status) => assert_eq!(status.name, "first"),
            IndexState::NotReady => panic!("previous index should survive"),
        }
        assert_eq!(idx.query(&unit(4, 0), 1).await.unwrap(), vec!["aaaaaaaaaa"]);
    }

    #[tokio::test]
    async fn test_second_replace_supersedes_first() {
        let idx = index(2);
        idx.replace("one", 10, chunks("aaaaaaaaaa"), vec![unit(2, 0)]).await.unwrap();
        idx.replace("two", 10, chunks("zzzzzzzzzz"), vec![unit(2, 0)]).await.unwrap();
        assert_eq!(idx.query(&unit(2, 0), 5).await.unwrap(), vec!["zzzzzzzzzz"]);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let idx = index(2);
        idx.replace("one", 10, chunks("aaaaaaaaaa"), vec![unit(2, 0)]).await.unwrap();
        idx.clear().await.unwrap();
        idx.clear().await.unwrap();
        assert_eq!(idx.state().await, IndexState::NotReady);
        assert!(idx.query(&unit(2, 0), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_random_chunk_comes_from_document() {
        let idx = index(2);
        let cs = chunks("aaaaaaaaaabbbbbbbbbb");
        let texts: Vec<String> = cs.iter().map(|c| c.text.clone()).collect();
        idx.replace("doc", 20, cs, vec![unit(2, 0), unit(2, 1)]).await.unwrap();
        let picked = idx.random_chunk().await.unwrap();
        assert!(texts.contains(&picked.text));
    }

    #[tokio::test]
    async fn test_open_restores_persisted_collection() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = Arc::new(FileVectorStore::open(tmp.path()).await.unwrap());
            let idx = DocumentIndex::new(store, 2);
            idx.replace("doc", 20, chunks("aaaaaaaaaabbbbbbbbbb"), vec![unit(2, 0), unit(2, 1)])
                .await
                .unwrap();
        }

        let store = Arc::new(FileVectorStore::open(tmp.path()).await.unwrap());
        let idx = DocumentIndex::open(store, 2).await.unwrap();
        match idx.state().await {
            IndexState::Ready(status) => {
                assert_eq!(status.chunk_count, 2);
                assert_eq!(status.char_count, 20);
            }
            IndexState::NotReady => panic!("expected restored index"),
        }
    }

    #[tokio::test]
    async fn test_open_discards_wrong_dimension() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = Arc::new(FileVectorStore::open(tmp.path()).await.unwrap());
            DocumentIndex::new(store, 3)
                .replace("doc", 10, chunks("aaaaaaaaaa"), vec![unit(3, 0)])
                .await
                .unwrap();
        }
        let store = Arc::new(FileVectorStore::open(tmp.path()).await.unwrap());
        let idx = DocumentIndex::open(store, 2).await.unwrap();
        assert_eq!(idx.state().await, IndexState::NotReady);
    }
}
