use crate::backends::CompletionRequest;
use crate::evaluation::{parse_evaluation, truncate_chars, Evaluation, MAX_IMPROVED_CHARS};
use crate::llm::LlmClient;
use std::sync::Arc;
use tracing::{debug, warn};

const DONT_KNOW_PHRASES: &[&str] = &[
    "i don't know",
    "don't know",
    "dont know",
    "no idea",
    "not sure",
    "idk",
    "dunno",
    "no clue",
];

const DONT_KNOW_CORRECT: &str = "It's okay to not know something - that's how we learn!";
const DONT_KNOW_MISSING: &str =
    "Try reading the document section again and give it your best guess.";

const FAILURE_CORRECT: &str = "Answer received";
const FAILURE_MISSING: &str = "Unable to evaluate at this time";
const FAILURE_PREFIX: &str = "Based on the document: ";

const SYSTEM_PROMPT: &str = "You are a friendly tutor providing structured feedback to students.";

/// True when the answer admits not knowing (case-insensitive, curly
/// apostrophes normalized).
pub fn is_dont_know(answer: &str) -> bool {
    let normalized = answer.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    DONT_KNOW_PHRASES.iter().any(|p| normalized.contains(p))
}

/// Grades free-text answers against reference material. Never fails: every
/// error path resolves to a well-formed [`Evaluation`].
pub struct Evaluator {
    llm: Arc<LlmClient>,
}

impl Evaluator {
    /// Create an evaluator using `llm`.
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Grade `user_answer` to `question` against `context`. Never fails.
    pub async fn evaluate(&self, question: &str, user_answer: &str, context: &str) -> Evaluation {
        if is_dont_know(user_answer) {
            debug!("Answer admits not knowing, skipping completion");
            return Evaluation::new(
                1,
                vec![DONT_KNOW_CORRECT.to_string()],
                vec![DONT_KNOW_MISSING.to_string()],
                "",
            );
        }

        let request = CompletionRequest::new(build_prompt(question, user_answer, context))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(800)
            .with_temperature(0.7);

        match self.llm.complete(&request).await {
            Ok(text) => parse_evaluation(&text, context),
            Err(e) => {
                warn!(error = %e, "Evaluation completion failed, using default");
                failure_default(context)
            }
        }
    }
}

fn failure_default(context: &str) -> Evaluation {
    Evaluation::new(
        5,
        vec![FAILURE_CORRECT.to_string()],
        vec![FAILURE_MISSING.to_string()],
        &format!("{FAILURE_PREFIX}{}", truncate_chars(context, MAX_IMPROVED_CHARS)),
    )
}

fn build_prompt(question: &str, user_answer: &str, context: &str) -> String {
    format!(
        "You are a friendly tutor evaluating a student's answer. Provide structured feedback.

Question: {question}
Student's Answer: {user_answer}
Reference Material: {context}

Provide your evaluation in this EXACT format:

SCORE: [number from 1-10]

CORRECT POINTS:
- [what the student got right]
- [another correct point if applicable]

MISSING POINTS:
- [what could be improved]
- [what was missing]

IMPROVED ANSWER:
[A complete, well-explained answer that the student can learn from. Include all key points from the reference material.]

Be encouraging and constructive in your feedback."
    )
}
