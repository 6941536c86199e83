use async_trait::async_trait;
use docent_core::{DocentError, DocentResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Embedding width used across the workspace unless configured otherwise.
pub const DEFAULT_DIMENSION: usize = 384;

/// Trait for computing text embeddings (vector representations).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embedding vector for a single text.
    async fn embed(&self, text: &str) -> DocentResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, one vector per text, same order.
    async fn embed_batch(&self, texts: &[&str]) -> DocentResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the embedding vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Embed `texts` under a deadline, substituting all-zero vectors when the
/// provider fails, times out, or returns the wrong shape.
pub async fn embed_or_zero(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    deadline: Duration,
) -> Vec<Vec<f32>> {
    let dimension = provider.dimension();
    let zeros = || vec![vec![0.0f32; dimension]; texts.len()];

    match tokio::time::timeout(deadline, provider.embed_batch(texts)).await {
        Ok(Ok(vectors))
            if vectors.len() == texts.len() && vectors.iter().all(|v| v.len() == dimension) =>
        {
            vectors
        }
        Ok(Ok(vectors)) => {
            warn!(
                expected = texts.len(),
                got = vectors.len(),
                "Embedding provider returned a malformed batch, using zero vectors"
            );
            zeros()
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Embedding failed, using zero vectors");
            zeros()
        }
        Err(_) => {
            warn!(timeout_ms = deadline.as_millis() as u64, "Embedding timed out, using zero vectors");
            zeros()
        }
    }
}

/// Which embedding backend to build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Hashed bag-of-words features computed in-process.
    #[default]
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    Http,
}

/// `[embedding]` section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which provider to build.
    #[serde(default)]
    pub backend: EmbeddingBackend,
    /// Width of every vector in the index.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Remote model name. HTTP backend only.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Base URL of the embeddings API. Required by the HTTP backend.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Bearer token for the embeddings API.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Deadline for one embedding call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            dimension: default_dimension(),
            model_id: None,
            api_base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    /// `timeout_secs` as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Local feature-hashing embedding (no external API needed).
///
/// Lowercased word unigrams and adjacent-word bigrams are hashed into a fixed
/// number of buckets with a hash-derived sign, weighted by term frequency and
/// L2-normalized. Deterministic across runs and processes. Text with no
/// words (blank lines, punctuation) maps to the zero vector, which is
/// equidistant from every query.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Create a provider emitting `dimension`-wide vectors (at least 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> DocentResult<Vec<f32>> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1)
            .collect();

        let mut features: HashMap<String, f32> = HashMap::new();
        for word in &words {
            *features.entry((*word).to_string()).or_insert(0.0) += 1.0;
        }
        for pair in words.windows(2) {
            *features.entry(format!("{} {}", pair[0], pair[1])).or_insert(0.0) += 0.5;
        }

        let mut vector = vec![0.0f32; self.dimension];
        let total = words.len().max(1) as f32;
        for (feature, weight) in &features {
            let hash = fnv1a(feature.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * weight / total;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// 64-bit FNV-1a.
fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// OpenAI-compatible embeddings backend (`POST {base}/v1/embeddings`).
#[cfg(feature = "http-embeddings")]
pub struct HttpEmbedding {
    base_url: String,
    model_id: String,
    api_key: Option<String>,
    dimension: usize,
    http: reqwest::Client,
}

#[cfg(feature = "http-embeddings")]
impl HttpEmbedding {
    /// Create a client for `{base_url}/v1/embeddings`.
    pub fn new(
        base_url: impl Into<String>,
        model_id: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_id: model_id.into(),
            api_key,
            dimension,
            http: reqwest::Client::new(),
        }
    }

    /// Build from the `[embedding]` section. Fails without `api_base_url`.
    pub fn from_config(config: &EmbeddingConfig) -> DocentResult<Self> {
        let base_url = config.api_base_url.clone().ok_or_else(|| {
            DocentError::Config("embedding.api_base_url is required for the http backend".into())
        })?;
        let model_id = config
            .model_id
            .clone()
            .unwrap_or_else(|| "text-embedding-3-small".to_string());
        Ok(Self::new(base_url, model_id, config.api_key.clone(), config.dimension))
    }
}

#[cfg(feature = "http-embeddings")]
#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> DocentResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| DocentError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> DocentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model_id,
            "input": texts,
            "dimensions": self.dimension,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let resp = request
            .send()
            .await
            .map_err(|e| DocentError::Http(e.to_string()))?;
        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DocentError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(DocentError::Http(format!(
                "Embedding API error {status}: {resp_body}"
            )));
        }

        parse_embedding_response(&resp_body, texts.len(), self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Pull `data[*].embedding` out of an embeddings response, ordered by `index`.
pub fn parse_embedding_response(
    body: &serde_json::Value,
    expected: usize,
    dimension: usize,
) -> DocentResult<Vec<Vec<f32>>> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| DocentError::Embedding("Response has no data array".to_string()))?;

    let mut indexed: Vec<(u64, Vec<f32>)> = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().unwrap_or(position as u64);
        let vector: Vec<f32> = item["embedding"]
            .as_array()
            .ok_or_else(|| DocentError::Embedding("Item has no embedding".to_string()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        if vector.len() != dimension {
            return Err(DocentError::DimensionMismatch(format!(
                "expected {dimension}, got {}",
                vector.len()
            )));
        }
        indexed.push((index, vector));
    }

    if indexed.len() != expected {
        return Err(DocentError::DimensionMismatch(format!(
            "expected {expected} embeddings, got {}",
            indexed.len()
        )));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}
