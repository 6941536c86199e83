use crate::chunker::Chunker;
use crate::embedding::{embed_or_zero, EmbeddingProvider};
use crate::index::{DocumentIndex, DocumentStatus, IndexState};
use docent_core::{DocentError, DocentResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Top-k settings for the two retrieval call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved for document chat.
    #[serde(default = "default_chat_k")]
    pub chat_k: usize,
    /// Chunks retrieved as grading context.
    #[serde(default = "default_evaluation_k")]
    pub evaluation_k: usize,
}

fn default_chat_k() -> usize {
    3
}

fn default_evaluation_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chat_k: default_chat_k(),
            evaluation_k: default_evaluation_k(),
        }
    }
}

/// Turns documents into an index and questions into context.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<DocumentIndex>,
    chunker: Chunker,
    embed_timeout: Duration,
}

impl RetrievalEngine {
    /// Create an engine that chunks with `chunker` and bounds every embedding call by `embed_timeout`.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<DocumentIndex>,
        chunker: Chunker,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            embed_timeout,
        }
    }

    /// The index this engine fills.
    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// Up to `k` chunk texts most relevant to `query`, nearest first.
    ///
    /// Empty when no document is loaded. An embedding failure degrades to a
    /// zero query vector rather than an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        if !self.index.state().await.is_ready() {
            return Vec::new();
        }

        let mut vectors = embed_or_zero(self.embedder.as_ref(), &[query], self.embed_timeout).await;
        let embedding = vectors
            .pop()
            .unwrap_or_else(|| vec![0.0; self.embedder.dimension()]);

        match self.index.query(&embedding, k).await {
            Ok(texts) => texts,
            Err(e) => {
                warn!(error = %e, "Index query failed");
                Vec::new()
            }
        }
    }

    /// Chunk, embed and index `text` as the active document.
    ///
    /// On any failure the index is cleared, leaving no document loaded.
    pub async fn ingest(&self, name: &str, text: &str) -> DocentResult<DocumentStatus> {
        match self.try_ingest(name, text).await {
            Ok(status) => Ok(status),
            Err(e) => {
                warn!(name, error = %e, "Ingestion failed, clearing index");
                if let Err(clear_err) = self.index.clear().await {
                    warn!(error = %clear_err, "Failed to clear index after ingestion failure");
                }
                Err(e)
            }
        }
    }

    async fn try_ingest(&self, name: &str, text: &str) -> DocentResult<DocumentStatus> {
        if text.trim().is_empty() {
            return Err(DocentError::InvalidInput(
                "No text could be extracted from the document".to_string(),
            ));
        }

        let chunks = self.chunker.chunk(text);
        info!(name, chunks = chunks.len(), "Document chunked");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = tokio::time::timeout(self.embed_timeout, self.embedder.embed_batch(&texts))
            .await
            .map_err(|_| DocentError::Timeout("embedding document chunks".to_string()))??;

        let char_count = text.chars().count();
        self.index.replace(name, char_count, chunks, embeddings).await
    }

    /// Unload the active document.
    pub async fn clear(&self) -> DocentResult<()> {
        self.index.clear().await
    }

    /// Whether a document is loaded.
    pub async fn status(&self) -> IndexState {
        self.index.state().await
    }
}
