use crate::evaluation::Evaluation;
use crate::evaluator::Evaluator;
use crate::greeting;
use crate::llm::LlmClient;
use crate::questions::{practice_fallback, QuestionGenerator, QUIZ_FALLBACK};
use crate::responder::{ChatReply, Reply, Responder};
use docent_core::{DocentError, DocentResult, Message};
use docent_memory::{extract_text, DocumentStatus, IndexState, RetrievalConfig, RetrievalEngine};
use docent_session::{validate_session_id, SessionStore, SessionSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Score at or above which an answer counts as correct.
pub const CORRECT_THRESHOLD: u8 = 7;

/// Topic used for practice questions when none is known.
pub const GENERAL_TOPIC: &str = "general knowledge";

const NOT_READY: &str = "No document uploaded. Please upload a PDF or TXT file first.";

/// Evaluation of one answer plus its effect on the session, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerFeedback {
    /// Score, points and improved answer, flattened into the response.
    #[serde(flatten)]
    pub evaluation: Evaluation,
    /// Whether the score reached [`CORRECT_THRESHOLD`].
    pub is_correct: bool,
    /// The evaluation rendered as one sentence block.
    pub feedback: String,
    /// Session state after counting the answer, when graded in a session.
    #[serde(rename = "session_info", skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

/// A practice question for a session's topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQuestion {
    /// The generated question.
    pub question: String,
    /// The topic asked about.
    pub topic: String,
    /// Session state after asking.
    #[serde(rename = "session_info")]
    pub session: SessionSummary,
}

/// Single entry point for every tutoring operation.
///
/// Document-bound operations check the index state once, up front, and fail
/// with `NotReady` when no document is loaded. Everything downstream of that
/// check degrades to fallbacks instead of failing.
pub struct Tutor {
    retrieval: Arc<RetrievalEngine>,
    sessions: Arc<dyn SessionStore>,
    responder: Responder,
    evaluator: Evaluator,
    questions: QuestionGenerator,
    config: RetrievalConfig,
}

impl Tutor {
    /// Wire the tutor to its retrieval engine, session store and completion client.
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        sessions: Arc<dyn SessionStore>,
        llm: Arc<LlmClient>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            responder: Responder::new(llm.clone(), sessions.clone()),
            evaluator: Evaluator::new(llm.clone()),
            questions: QuestionGenerator::new(llm),
            retrieval,
            sessions,
            config,
        }
    }

    async fn ensure_ready(&self) -> DocentResult<DocumentStatus> {
        match self.retrieval.status().await {
            IndexState::Ready(status) => Ok(status),
            IndexState::NotReady => Err(DocentError::NotReady(NOT_READY.to_string())),
        }
    }

    /// Answer a question about the loaded document.
    pub async fn chat(&self, message: &str) -> DocentResult<ChatReply> {
        require_text("message", message)?;
        self.ensure_ready().await?;

        if let Some(kind) = greeting::classify(message) {
            return Ok(ChatReply {
                response: kind.reply().to_string(),
                sources: Vec::new(),
            });
        }

        let chunks = self.retrieval.retrieve(message, self.config.chat_k).await;
        Ok(self.responder.chat(message, &chunks).await)
    }

    /// A short question about a random section of the loaded document.
    pub async fn quiz_question(&self) -> DocentResult<String> {
        self.ensure_ready().await?;
        match self.retrieval.index().random_chunk().await {
            Some(chunk) => Ok(self.questions.quiz_question(&chunk.text).await),
            None => Ok(QUIZ_FALLBACK.to_string()),
        }
    }

    /// Grade `answer` against document context.
    ///
    /// Without a session this is the document quiz and needs a loaded
    /// document. With a session the answer is counted toward its progress
    /// and recorded in its history; the context is empty when no document is
    /// loaded.
    pub async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        session_id: Option<&str>,
    ) -> DocentResult<AnswerFeedback> {
        require_text("question", question)?;
        require_text("answer", answer)?;

        let Some(session_id) = session_id else {
            self.ensure_ready().await?;
            let evaluation = self.grade(question, answer).await;
            return Ok(feedback_for(evaluation, None));
        };

        validate_session_id(session_id)?;
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;

        let evaluation = self.grade(question, answer).await;
        let correct = evaluation.score >= CORRECT_THRESHOLD;
        session.record_answer(correct);
        let summary_text = feedback_text(&evaluation);
        session.add_exchange(answer, summary_text.as_str());
        info!(
            session_id = %session_id,
            score = evaluation.score,
            correct,
            "Answer evaluated"
        );

        Ok(feedback_for(evaluation, Some(session.summary())))
    }

    async fn grade(&self, question: &str, answer: &str) -> Evaluation {
        let chunks = self.retrieval.retrieve(question, self.config.evaluation_k).await;
        let context = chunks.join(" ");
        self.evaluator.evaluate(question, answer, &context).await
    }

    /// One conversational tutoring turn.
    pub async fn converse(&self, session_id: &str, message: &str) -> DocentResult<Reply> {
        validate_session_id(session_id)?;
        require_text("message", message)?;
        Ok(self.responder.respond(session_id, message).await)
    }

    /// A practice question on `topic`, the session's topic, or general
    /// knowledge, in that order of preference.
    pub async fn practice_question(
        &self,
        session_id: &str,
        topic: Option<&str>,
    ) -> DocentResult<PracticeQuestion> {
        validate_session_id(session_id)?;
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;

        let topic = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| session.current_topic.clone())
            .unwrap_or_else(|| GENERAL_TOPIC.to_string());

        let question = match self.questions.practice_question(&topic).await {
            Some(question) => {
                session.add_message(Message::assistant(question.as_str()));
                question
            }
            None => practice_fallback(&topic),
        };

        Ok(PracticeQuestion {
            question,
            topic,
            session: session.summary(),
        })
    }

    /// Progress of a session, created empty if unknown.
    pub async fn progress(&self, session_id: &str) -> DocentResult<SessionSummary> {
        validate_session_id(session_id)?;
        let handle = self.sessions.get_or_create(session_id).await;
        let summary = handle.lock().await.summary();
        Ok(summary)
    }

    /// Forget a session. Returns whether it existed.
    pub async fn reset_session(&self, session_id: &str) -> DocentResult<bool> {
        validate_session_id(session_id)?;
        Ok(self.sessions.reset(session_id).await)
    }

    /// Replace the active document with the text of an uploaded file.
    ///
    /// Any failure, extraction included, leaves no document loaded.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> DocentResult<DocumentStatus> {
        info!(file_name, bytes = bytes.len(), "Starting document upload");
        let text = match extract_text(file_name, bytes).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file_name, error = %e, "Extraction failed, clearing index");
                self.retrieval.clear().await?;
                return Err(e);
            }
        };
        self.retrieval.ingest(file_name, &text).await
    }

    /// Drop the active document. Idempotent.
    pub async fn clear(&self) -> DocentResult<()> {
        self.retrieval.clear().await
    }

    /// Start over with no document and return a short token for the new
    /// session.
    pub async fn start_session(&self) -> DocentResult<String> {
        self.retrieval.clear().await?;
        let token: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        info!(token = %token, "New session started, document cleared");
        Ok(token)
    }

    /// Whether a document is loaded.
    pub async fn status(&self) -> IndexState {
        self.retrieval.status().await
    }

    /// The session store backing conversational mode.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }
}

fn require_text(field: &str, value: &str) -> DocentResult<()> {
    if value.trim().is_empty() {
        return Err(DocentError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

fn feedback_for(evaluation: Evaluation, session: Option<SessionSummary>) -> AnswerFeedback {
    AnswerFeedback {
        is_correct: evaluation.score >= CORRECT_THRESHOLD,
        feedback: feedback_text(&evaluation),
        evaluation,
        session,
    }
}

/// One-paragraph feedback recorded in session history.
fn feedback_text(evaluation: &Evaluation) -> String {
    let mut text = format!("Score: {}/10.", evaluation.score);
    if let Some(point) = evaluation.correct_points.first() {
        text.push_str(&format!(" What you got right: {point}"));
    }
    if let Some(point) = evaluation.missing_points.first() {
        text.push_str(&format!(" To improve: {point}"));
    }
    text
}
