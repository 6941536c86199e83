use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported completion providers. All speak the OpenAI chat API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// api.openai.com.
    OpenAi,
    /// openrouter.ai, sent with attribution headers.
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    #[default]
    Groq,
}

/// `[model]` section: completion provider settings. Sampling limits belong
/// to each call site, and unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Which provider to call.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name sent with every request.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Literal key. Takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: String,
    /// Environment variable to read the key from when `api_key` is empty.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Overrides the provider's default base URL.
    pub api_base_url: Option<String>,
    /// Deadline for one completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_id() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            api_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// `api_base_url`, or the provider's default.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }

    /// The API key, falling back to `api_key_env` when none is set inline.
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// `timeout_secs` as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
