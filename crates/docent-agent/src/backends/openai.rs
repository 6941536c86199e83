use super::{CompletionRequest, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use docent_core::{DocentError, DocentResult, Role};

/// OpenAI-compatible API backend.
///
/// Works with OpenAI, OpenRouter, Groq, and any other provider
/// that implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a backend for `config`, resolving its API key once.
    pub fn new(config: ModelConfig) -> Self {
        let api_key = config.resolved_api_key();
        Self {
            config,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    fn build_messages(&self, request: &CompletionRequest) -> Vec<serde_json::Value> {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = &request.system_prompt {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for m in &request.messages {
            if m.role == Role::System {
                continue;
            }
            api_messages.push(serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content
            }));
        }

        api_messages
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "Docent")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> DocentResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": self.build_messages(request),
        });

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
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
                "OpenAI API error {status}: {resp_body}"
            )));
        }

        parse_openai_response(&resp_body)
    }
}

/// Extract the first choice's message text.
pub fn parse_openai_response(body: &serde_json::Value) -> DocentResult<String> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .trim();

    if content.is_empty() {
        return Err(DocentError::Completion(
            "Completion response has no content".to_string(),
        ));
    }
    Ok(content.to_string())
}
