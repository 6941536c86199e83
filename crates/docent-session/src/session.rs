use chrono::{DateTime, Utc};
use docent_core::Message;
use serde::{Deserialize, Serialize};

/// A learner's conversation: turn history, topic and answer counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Caller-chosen session id.
    pub id: String,
    /// Every turn in order. Only the prompt window is bounded.
    pub history: Vec<Message>,
    /// Last topic the learner asked about.
    pub current_topic: Option<String>,
    /// Answers graded in this session.
    pub questions_asked: u32,
    /// Answers that scored at or above the pass mark.
    pub correct_answers: u32,
    /// Time the session was first referenced.
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            history: Vec::new(),
            current_topic: None,
            questions_asked: 0,
            correct_answers: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one turn.
    pub fn add_message(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.history.push(message);
    }

    /// Append one user turn and the assistant's reply to it.
    pub fn add_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.add_message(Message::user(user));
        self.add_message(Message::assistant(assistant));
    }

    /// Count one answered question.
    pub fn record_answer(&mut self, correct: bool) {
        self.questions_asked += 1;
        if correct {
            self.correct_answers += 1;
        }
        self.updated_at = Utc::now();
    }

    /// Replace the current topic.
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.current_topic = Some(topic.into());
        self.updated_at = Utc::now();
    }

    /// Number of turns in the history.
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Percentage of correct answers, 0 before any question was answered.
    pub fn accuracy(&self) -> f64 {
        if self.questions_asked == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.questions_asked) * 100.0
        }
    }

    /// Snapshot of the session's progress.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            current_topic: self.current_topic.clone(),
            questions_asked: self.questions_asked,
            correct_answers: self.correct_answers,
            accuracy: self.accuracy(),
        }
    }
}

/// Public snapshot of a session's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Id of the summarized session.
    pub session_id: String,
    /// Last topic the learner asked about.
    pub current_topic: Option<String>,
    /// Answers graded so far.
    pub questions_asked: u32,
    /// Answers that passed.
    pub correct_answers: u32,
    /// Percentage, 0 to 100.
    pub accuracy: f64,
}
