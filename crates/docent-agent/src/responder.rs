use crate::backends::CompletionRequest;
use crate::context::{ContextWindow, PROMPT_WINDOW};
use crate::llm::LlmClient;
use docent_session::{SessionStore, SessionSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Phrases that introduce a topic, checked in this order.
const TOPIC_PHRASES: &[&str] = &["tell me about", "teach me about", "teach me", "what is", "explain"];

/// Conversational reply used when the completion fails.
pub const CONVERSATION_FALLBACK: &str =
    "Hmm, I'm having a bit of trouble right now. Could you say that again?";
/// Document chat reply when retrieval found nothing.
pub const NO_CONTEXT_REPLY: &str = "I couldn't find relevant information in the document to answer your question. Could you try rephrasing or asking about a different topic from the document?";
/// Document chat reply used when the completion fails.
pub const CHAT_FALLBACK: &str =
    "Sorry, I ran into a problem while answering that. Please try asking again in a moment.";

/// Number of retrieved chunks returned as sources.
const MAX_SOURCES: usize = 2;

const PERSONA: &str = "You are a friendly, enthusiastic tutor having a natural conversation with a student.

Your personality:
- Talk like a real person, not a robot
- Use casual, warm language
- Be encouraging and supportive
- Use examples and analogies from everyday life
- Ask follow-up questions naturally

Conversation style:
- Keep responses short and conversational (2-3 sentences)
- Use contractions (I'm, you're, let's)
- Don't be overly formal or academic

Teaching approach:
- Explain concepts simply, like you're chatting with a friend
- Check understanding by asking questions naturally
- Celebrate progress and effort";

const DOCUMENT_SYSTEM: &str =
    "You are a helpful assistant that answers questions based on provided document content.";

/// A conversational turn's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// The tutor's reply.
    pub response: String,
    /// Session state after the turn.
    #[serde(rename = "session_info")]
    pub session: SessionSummary,
}

/// A document chat answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// The answer text.
    pub response: String,
    /// Up to two of the chunks used, nearest first.
    pub sources: Vec<String>,
}

/// The topic named by `input`, if it contains a topic phrase.
///
/// The first matching phrase is removed from the lowercased input; trailing
/// punctuation is dropped. Returns `None` when nothing is left.
pub fn extract_topic(input: &str) -> Option<String> {
    let lowered = input.to_lowercase();
    let phrase = TOPIC_PHRASES.iter().find(|p| lowered.contains(*p))?;
    let topic = lowered
        .replace(phrase, "")
        .trim()
        .trim_end_matches(['?', '.', '!'])
        .trim()
        .to_string();
    (!topic.is_empty()).then_some(topic)
}

/// Produces tutor replies, either in a tracked conversation or grounded in
/// retrieved document chunks.
pub struct Responder {
    llm: Arc<LlmClient>,
    sessions: Arc<dyn SessionStore>,
}

impl Responder {
    /// Create a responder over `sessions`.
    pub fn new(llm: Arc<LlmClient>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { llm, sessions }
    }

    /// Answer `user_input` within the session's recent history.
    ///
    /// On success the exchange is appended and the topic updated. On failure
    /// a fixed fallback is returned and the session is left untouched.
    pub async fn respond(&self, session_id: &str, user_input: &str) -> Reply {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;

        let mut window = ContextWindow::from_history(PROMPT_WINDOW, &session.history);
        window.set_system_prompt(PERSONA);
        let request = window.into_request(user_input, 250, 0.9);

        match self.llm.complete(&request).await {
            Ok(response) => {
                session.add_exchange(user_input, response.as_str());
                if let Some(topic) = extract_topic(user_input) {
                    info!(session_id = %session_id, topic = %topic, "Session topic updated");
                    session.set_topic(topic);
                }
                Reply {
                    response,
                    session: session.summary(),
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Conversation completion failed");
                Reply {
                    response: CONVERSATION_FALLBACK.to_string(),
                    session: session.summary(),
                }
            }
        }
    }

    /// Answer `message` from `context_chunks` (nearest first). Small talk is
    /// expected to be filtered out by the caller before retrieval.
    pub async fn chat(&self, message: &str, context_chunks: &[String]) -> ChatReply {
        if context_chunks.is_empty() {
            return ChatReply {
                response: NO_CONTEXT_REPLY.to_string(),
                sources: Vec::new(),
            };
        }

        let context = context_chunks.join(" ");
        let request = CompletionRequest::new(document_prompt(message, &context))
            .with_system(DOCUMENT_SYSTEM)
            .with_max_tokens(300)
            .with_temperature(0.7);

        let response = match self.llm.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Document chat completion failed");
                CHAT_FALLBACK.to_string()
            }
        };

        ChatReply {
            response,
            sources: context_chunks.iter().take(MAX_SOURCES).cloned().collect(),
        }
    }
}

fn document_prompt(message: &str, context: &str) -> String {
    format!(
        "You are a helpful tutor explaining concepts from a document. Answer the user's question in a clear, conversational way using simple language. Avoid technical formatting, markdown, or complex symbols.

Document Content:
{context}

User Question: {message}

Please explain this in simple, easy-to-understand language as if you're talking to a student:"
    )
}
