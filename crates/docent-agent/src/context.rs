use crate::backends::CompletionRequest;
use docent_core::Message;

/// History turns included in a conversational prompt.
pub const PROMPT_WINDOW: usize = 6;

/// The prompt view of a conversation: a system prompt plus the most recent
/// turns. Older turns are dropped from the prompt only; session storage
/// keeps them.
pub struct ContextWindow {
    messages: Vec<Message>,
    system_prompt: Option<String>,
}

impl ContextWindow {
    /// A window seeded with the last `max_messages` turns of `history`.
    pub fn from_history(max_messages: usize, history: &[Message]) -> Self {
        let start = history.len().saturating_sub(max_messages);
        Self {
            messages: history[start..].to_vec(),
            system_prompt: None,
        }
    }

    /// Set the persona sent ahead of the turns.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    /// Build a request from the window followed by `input` as the newest
    /// user turn. The input is never truncated away.
    pub fn into_request(self, input: &str, max_tokens: u32, temperature: f32) -> CompletionRequest {
        let mut messages = self.messages;
        messages.push(Message::user(input));
        CompletionRequest {
            system_prompt: self.system_prompt,
            messages,
            max_tokens,
            temperature,
        }
    }
}
