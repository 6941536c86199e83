//! Document ingestion and semantic retrieval for Docent.
//!
//! A document is split into overlapping chunks, each chunk is embedded, and
//! the embeddings are kept in a single-document vector index that answers
//! top-k nearest-neighbour queries.
//!
//! # Main types
//!
//! - [`Chunker`]: Splits text into overlapping, boundary-aware chunks.
//! - [`EmbeddingProvider`]: Trait for computing text embeddings.
//! - [`LocalEmbedding`]: Deterministic feature-hashing embeddings, no network.
//! - [`VectorStore`]: Trait for the backing store of index entries.
//! - [`DocumentIndex`]: Lifecycle of the one active document's index.
//! - [`RetrievalEngine`]: Ingestion and top-k retrieval over the index.

/// Overlapping text chunking.
pub mod chunker;
/// Embedding provider trait, local and HTTP implementations.
pub mod embedding;
/// Text extraction from uploaded files.
pub mod extract;
/// Active-document index lifecycle.
pub mod index;
/// Ingestion and retrieval over the active document.
pub mod retrieval;
/// Vector store trait with in-memory and file-backed implementations.
pub mod store;

pub use chunker::{Chunk, Chunker, ChunkingConfig};
#[cfg(feature = "http-embeddings")]
pub use embedding::HttpEmbedding;
pub use embedding::{
    embed_or_zero, EmbeddingBackend, EmbeddingConfig, EmbeddingProvider, LocalEmbedding,
    DEFAULT_DIMENSION,
};
pub use extract::{extract_text, FileKind};
pub use index::{ActiveDocument, DocumentIndex, DocumentStatus, IndexState};
pub use retrieval::{RetrievalConfig, RetrievalEngine};
pub use store::{FileVectorStore, InMemoryVectorStore, IndexEntry, SearchHit, VectorStore};
