/// OpenAI-compatible chat completions backend.
pub mod openai;

use docent_core::{DocentResult, Message};
use async_trait::async_trait;

/// One completion call: optional system prompt, conversation turns and
/// sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Sent as the first `system` message when set.
    pub system_prompt: Option<String>,
    /// Conversation turns, oldest first.
    pub messages: Vec<Message>,
    /// Completion length limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// A single user turn with default limits.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            messages: vec![Message::user(prompt)],
            max_tokens: 300,
            temperature: 0.7,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the completion length limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The content of the last user turn, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == docent_core::Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Trait for completion service backends.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` enum in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Non-streaming completion returning the generated text.
    async fn complete(&self, request: &CompletionRequest) -> DocentResult<String>;
}
