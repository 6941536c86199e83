//! Core types and error definitions for the Docent tutoring engine.
//!
//! This crate provides the foundational types shared across all Docent crates:
//! the unified error type and the conversation turn stored in session history.
//!
//! # Main types
//!
//! - [`DocentError`]: Unified error enum for all Docent subsystems.
//! - [`DocentResult`]: Convenience alias for `Result<T, DocentError>`.
//! - [`Role`]: Message role (user, assistant, system).
//! - [`Message`]: A single turn within a conversation session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for the Docent workspace.
///
/// Input and readiness errors are surfaced to callers; dependency errors
/// (embedding, completion, timeouts) are normally absorbed into fallback
/// values by the component that made the call.
#[derive(Debug, thiserror::Error)]
pub enum DocentError {
    /// The caller supplied unusable input (empty document, bad session id).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The uploaded file kind cannot be extracted.
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    /// An operation needed a loaded document but none is active.
    #[error("No document loaded: {0}")]
    NotReady(String),

    /// Chunk and embedding counts, or embedding widths, disagree.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An error from an outbound HTTP request (LLM or embedding API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A dependency call did not finish within its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The embedding provider failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The completion service failed or returned nothing usable.
    #[error("Completion error: {0}")]
    Completion(String),

    /// An error related to index or session persistence.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocentError {
    /// True for errors caused by the caller rather than by a dependency.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocentError::InvalidInput(_) | DocentError::UnsupportedFile(_) | DocentError::NotReady(_)
        )
    }
}

/// A convenience `Result` alias using [`DocentError`].
pub type DocentResult<T> = Result<T, DocentError>;

// --- Message types ---

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner.
    User,
    /// The tutor.
    Assistant,
    /// A system-level instruction or prompt.
    System,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single turn exchanged within a conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a new message with [`Role::System`].
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}
