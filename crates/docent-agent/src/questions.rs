use crate::backends::CompletionRequest;
use crate::llm::LlmClient;
use std::sync::Arc;
use tracing::warn;

/// Quiz question used when generation fails.
pub const QUIZ_FALLBACK: &str = "What are the main concepts discussed in this document section?";

const QUIZ_SYSTEM: &str = "You are a helpful tutor creating questions from document content.";

const PRACTICE_SYSTEM: &str = "You're a tutor creating a practice question. Make it conversational and engaging!

Style:
- Ask the question naturally, like you're chatting
- Use phrases like \"Alright, here's one for you:\", \"Let me ask you this:\", \"Quick question:\"
- Keep it clear and specific
- Don't be too formal

Create ONE question that tests understanding. Keep it conversational!";

/// Fallback practice question about `topic`.
pub fn practice_fallback(topic: &str) -> String {
    format!("Hey, so tell me - what do you think are the main ideas behind {topic}?")
}

/// Generates quiz questions from document chunks and practice questions
/// about a topic.
pub struct QuestionGenerator {
    llm: Arc<LlmClient>,
}

impl QuestionGenerator {
    /// Create a generator using `llm`.
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// A short question answerable from `chunk_text` in one or two sentences.
    pub async fn quiz_question(&self, chunk_text: &str) -> String {
        let prompt = format!(
            "Based on this document section, create a SHORT question that can be answered in 1-2 sentences. Make it simple and specific.

Document excerpt:
{chunk_text}

Create a brief, focused question that asks for a specific fact or concept. The answer should only need 1-2 sentences:"
        );
        let request = CompletionRequest::new(prompt)
            .with_system(QUIZ_SYSTEM)
            .with_max_tokens(100)
            .with_temperature(0.7);

        match self.llm.complete(&request).await {
            Ok(question) => question,
            Err(e) => {
                warn!(error = %e, "Quiz question generation failed");
                QUIZ_FALLBACK.to_string()
            }
        }
    }

    /// A conversational practice question about `topic`, or `None` when the
    /// completion fails.
    pub async fn practice_question(&self, topic: &str) -> Option<String> {
        let request = CompletionRequest::new(format!("Create a practice question about: {topic}"))
            .with_system(PRACTICE_SYSTEM)
            .with_max_tokens(120)
            .with_temperature(0.9);

        match self.llm.complete(&request).await {
            Ok(question) => Some(question),
            Err(e) => {
                warn!(topic, error = %e, "Practice question generation failed");
                None
            }
        }
    }
}
