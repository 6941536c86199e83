//! `docent.toml` loading. Every section is optional and defaults.

use anyhow::Context;
use docent_agent::ModelConfig;
use docent_gateway::ServerConfig;
use docent_memory::{ChunkingConfig, EmbeddingConfig, RetrievalConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct DocentConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// `[index]`: where the active document's vectors live.
#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    /// Keep the collection in `data_dir/index/` instead of memory.
    #[serde(default)]
    pub persist: bool,
    /// Drop any persisted collection at startup.
    #[serde(default = "default_true")]
    pub reset_on_start: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist: false,
            reset_on_start: true,
        }
    }
}

impl Default for DocentConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
            server: ServerConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

impl DocentConfig {
    /// Read `path`, or fall back to defaults when it does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use docent_agent::LlmProvider;
    use docent_memory::EmbeddingBackend;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DocentConfig::parse("").unwrap();
        assert!(matches!(config.model.provider, LlmProvider::Groq));
        assert!(matches!(config.embedding.backend, EmbeddingBackend::Local));
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.chat_k, 3);
        assert_eq!(config.retrieval.evaluation_k, 5);
        assert!(!config.index.persist);
        assert!(config.index.reset_on_start);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.index_dir(), PathBuf::from("./data/index"));
    }

    #[test]
    fn test_full_config() {
        let config = DocentConfig::parse(
            r#"
            data_dir = "/var/lib/docent"

            [model]
            provider = "openrouter"
            model_id = "meta-llama/llama-3.1-8b-instruct"
            api_key_env = "OPENROUTER_API_KEY"
            timeout_secs = 10

            [embedding]
            backend = "http"
            dimension = 1536
            api_base_url = "https://api.openai.com"

            [chunking]
            chunk_size = 800
            chunk_overlap = 100

            [index]
            persist = true
            reset_on_start = false

            [server]
            port = 9000
            cors_origins = ["*"]
            "#,
        )
        .unwrap();

        assert!(matches!(config.model.provider, LlmProvider::OpenRouter));
        assert_eq!(config.model.api_key_env.as_deref(), Some("OPENROUTER_API_KEY"));
        assert_eq!(config.model.timeout_secs, 10);
        assert!(matches!(config.embedding.backend, EmbeddingBackend::Http));
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.chunking.chunk_size, 800);
        assert!(config.index.persist);
        assert!(!config.index.reset_on_start);
        assert_eq!(config.server.cors_origins, vec!["*"]);
        assert_eq!(config.index_dir(), PathBuf::from("/var/lib/docent/index"));
    }

    #[test]
    fn test_shipped_sample_config_parses() {
        let config = DocentConfig::parse(include_str!("../../../docent.toml")).unwrap();
        assert!(matches!(config.model.provider, LlmProvider::Groq));
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.server.cors_origins.len(), 2);
    }

    #[test]
    fn test_sampling_keys_in_model_section_rejected() {
        assert!(DocentConfig::parse("[model]
temperature = 0.2").is_err());
        assert!(DocentConfig::parse("[model]
max_tokens = 800").is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(DocentConfig::parse("[model]\nprovider = \"nope\"").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocentConfig::load(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docent.toml");
        tokio::fs::write(&path, "[retrieval]\nchat_k = 4\n").await.unwrap();
        let config = DocentConfig::load(&path).await.unwrap();
        assert_eq!(config.retrieval.chat_k, 4);
        assert_eq!(config.retrieval.evaluation_k, 5);
    }
}
