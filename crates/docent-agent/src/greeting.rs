//! Canned replies for small talk in document chat.

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "what's up",
];

const CASUAL: &[&str] = &["thanks", "thank you", "ok", "okay", "cool", "nice", "great"];

const GREETING_REPLY: &str = "Hello! I'm here to help you understand the document you've uploaded. Feel free to ask me any questions about its content!";
const CASUAL_REPLY: &str = "You're welcome! Do you have any other questions about the document?";
const NUDGE_REPLY: &str =
    "I'm here to help you with questions about the document. What would you like to know?";

/// Kinds of message answered with a canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallTalk {
    /// "hi", "hello" and similar.
    Greeting,
    /// "thanks", "ok" and similar.
    Acknowledgement,
    /// Too short to be a question.
    Short,
}

impl SmallTalk {
    /// The canned reply for this kind.
    pub fn reply(&self) -> &'static str {
        match self {
            SmallTalk::Greeting => GREETING_REPLY,
            SmallTalk::Acknowledgement => CASUAL_REPLY,
            SmallTalk::Short => NUDGE_REPLY,
        }
    }
}

/// Classify `message` as small talk that needs no completion call.
///
/// Keywords match whole words, so "this" does not count as "hi".
pub fn classify(message: &str) -> Option<SmallTalk> {
    let lowered = message.trim().to_lowercase().replace('\u{2019}', "'");
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    let word_count = lowered.split_whitespace().count();

    if GREETINGS.iter().any(|k| contains_phrase(&words, k)) {
        return Some(SmallTalk::Greeting);
    }
    if word_count <= 3 && CASUAL.iter().any(|k| contains_phrase(&words, k)) {
        return Some(SmallTalk::Acknowledgement);
    }
    if word_count <= 2 && !lowered.contains('?') {
        return Some(SmallTalk::Short);
    }
    None
}

fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split(' ').collect();
    words.windows(parts.len()).any(|w| w == parts.as_slice())
}
