//! Language-model side of Docent.
//!
//! Provider backends and the [`LlmClient`] that bounds every completion with a
//! deadline, the answer [`Evaluator`], question generation, conversational
//! replies, and the [`Tutor`] facade that ties them to document retrieval and
//! learner sessions.

/// Completion requests and provider backends.
pub mod backends;
/// Model and provider configuration.
pub mod config;
/// Bounded prompt window over session history.
pub mod context;
pub mod evaluation;
/// Answer grading.
pub mod evaluator;
pub mod greeting;
/// Deadline-bounded completion client.
pub mod llm;
/// Quiz and practice question generation.
pub mod questions;
/// Document chat and conversational replies.
pub mod responder;
/// The facade behind every HTTP operation.
pub mod tutor;

#[cfg(test)]
mod test_support;

pub use backends::{CompletionRequest, LlmBackend};
pub use config::{LlmProvider, ModelConfig};
pub use context::ContextWindow;
pub use evaluation::{parse_evaluation, Evaluation};
pub use evaluator::Evaluator;
pub use llm::LlmClient;
pub use questions::QuestionGenerator;
pub use responder::{ChatReply, Reply, Responder};
pub use tutor::{AnswerFeedback, PracticeQuestion, Tutor};
