use crate::backends::openai::OpenAiBackend;
use crate::backends::{CompletionRequest, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use docent_core::{DocentError, DocentResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Completion client that dispatches to the configured provider backend and
/// bounds every call with a deadline.
pub struct LlmClient {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl LlmClient {
    /// Create a client for the provider named in `config`.
    pub fn new(config: ModelConfig) -> Self {
        let timeout = config.timeout();
        let backend: Arc<dyn LlmBackend> = match config.provider {
            LlmProvider::OpenAi | LlmProvider::OpenRouter | LlmProvider::Groq => {
                Arc::new(OpenAiBackend::new(config))
            }
        };
        Self { backend, timeout }
    }

    /// Create from a pre-built backend (for custom/external providers).
    pub fn from_backend(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Deadline applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one completion. Expiry of the deadline is `DocentError::Timeout`;
    /// blank output is `DocentError::Completion`.
    pub async fn complete(&self, request: &CompletionRequest) -> DocentResult<String> {
        let started = std::time::Instant::now();
        let text = tokio::time::timeout(self.timeout, self.backend.complete(request))
            .await
            .map_err(|_| {
                DocentError::Timeout(format!("completion exceeded {}s", self.timeout.as_secs()))
            })??;

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Completion finished");

        let text = text.trim();
        if text.is_empty() {
            return Err(DocentError::Completion("Empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}
