//! Tolerant parsing of free-text answer evaluations.
//!
//! The completion service is asked for four labelled sections:
//!
//! ```text
//! SCORE: 7
//! CORRECT POINTS:
//! - ...
//! MISSING POINTS:
//! - ...
//! IMPROVED ANSWER:
//! ...
//! ```
//!
//! Sections found by header are parsed strictly. Any section whose header is
//! absent is recovered heuristically from the whole text: the score from a
//! handful of phrasings, points by keyword, the improved answer from a line
//! that talks about a better answer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Maximum points kept per section.
pub const MAX_POINTS: usize = 3;
/// Maximum chars in an improved answer.
pub const MAX_IMPROVED_CHARS: usize = 500;
/// Score used when none can be found.
pub const DEFAULT_SCORE: u8 = 5;

pub(crate) const DEFAULT_CORRECT: &str = "You showed understanding of the topic.";
pub(crate) const DEFAULT_MISSING: &str = "Try to include more specific details from the document.";
pub(crate) const IMPROVED_PREFIX: &str = "Here's what the document says: ";

/// Graded feedback on one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Always within 1..=10.
    pub score: u8,
    /// What the answer got right, at most three.
    pub correct_points: Vec<String>,
    /// What the answer should add, at most three.
    pub missing_points: Vec<String>,
    /// A model answer, at most 500 chars.
    pub improved_answer: String,
}

impl Evaluation {
    /// Build an evaluation, enforcing the score range and the size caps.
    pub fn new(
        score: i64,
        mut correct_points: Vec<String>,
        mut missing_points: Vec<String>,
        improved_answer: &str,
    ) -> Self {
        correct_points.truncate(MAX_POINTS);
        missing_points.truncate(MAX_POINTS);
        Self {
            score: score.clamp(1, 10) as u8,
            correct_points,
            missing_points,
            improved_answer: truncate_chars(improved_answer.trim(), MAX_IMPROVED_CHARS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Score,
    Correct,
    Missing,
    Improved,
}

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*)?[*_]*\s*(score|correct points|missing points|improved answer)\s*[*_]*\s*(?::|$)[*_]*\s*(.*)$",
    )
    .unwrap_or_else(|e| panic!("invalid header regex: {e}"))
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$")
        .unwrap_or_else(|e| panic!("invalid bullet regex: {e}"))
});

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").unwrap_or_else(|e| panic!("invalid integer regex: {e}")));

static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"score[:\s]*(\d+)",
        r"(\d+)\s*out of 10",
        r"(\d+)/10",
        r"rate[:\s]*(\d+)",
        r"give[:\s]*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid score regex: {e}")))
    .collect()
});

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(good|correct|well|right|nice|excellent)\b")
        .unwrap_or_else(|e| panic!("invalid keyword regex: {e}"))
});

static IMPROVEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(improve|better|missing|could|should|try)\b")
        .unwrap_or_else(|e| panic!("invalid keyword regex: {e}"))
});

static IMPROVED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"better way|improved|explanation|answer")
        .unwrap_or_else(|e| panic!("invalid keyword regex: {e}"))
});

/// What the strict tier found. `None` means the header was absent.
#[derive(Debug, Default)]
struct Sections {
    score: Option<Option<i64>>,
    correct: Option<Vec<String>>,
    missing: Option<Vec<String>>,
    improved: Option<Vec<String>>,
}

fn split_sections(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some(caps) = HEADER.captures(line) {
            let name = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
            let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            let section = match name.as_str() {
                "score" => Section::Score,
                "correct points" => Section::Correct,
                "missing points" => Section::Missing,
                _ => Section::Improved,
            };
            match section {
                Section::Score => sections.score = Some(first_integer(rest)),
                Section::Correct => {
                    sections.correct.get_or_insert_with(Vec::new);
                }
                Section::Missing => {
                    sections.missing.get_or_insert_with(Vec::new);
                }
                Section::Improved => {
                    let lines = sections.improved.get_or_insert_with(Vec::new);
                    if !rest.is_empty() {
                        lines.push(rest.to_string());
                    }
                }
            }
            current = Some(section);
            continue;
        }

        match current {
            Some(Section::Score) => {
                if let Some(None) = sections.score {
                    sections.score = Some(first_integer(line));
                }
            }
            Some(Section::Correct) => push_bullet(&mut sections.correct, line),
            Some(Section::Missing) => push_bullet(&mut sections.missing, line),
            Some(Section::Improved) => {
                if let Some(lines) = sections.improved.as_mut() {
                    lines.push(line.to_string());
                }
            }
            None => {}
        }
    }

    sections
}

fn push_bullet(points: &mut Option<Vec<String>>, line: &str) {
    if let (Some(points), Some(caps)) = (points.as_mut(), BULLET.captures(line)) {
        if let Some(m) = caps.get(1) {
            let point = m.as_str().trim();
            if !point.is_empty() {
                points.push(point.to_string());
            }
        }
    }
}

fn first_integer(text: &str) -> Option<i64> {
    INTEGER.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Score from the first matching phrasing, in pattern order.
fn heuristic_score(text: &str) -> Option<i64> {
    let lowered = text.to_lowercase();
    SCORE_PATTERNS.iter().find_map(|re| {
        re.captures(&lowered)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Keyword buckets over lines long enough to be feedback sentences.
fn heuristic_lines(text: &str) -> (Vec<String>, Vec<String>, Option<String>) {
    let mut positive = Vec::new();
    let mut improvement = Vec::new();
    let mut improved = None;

    for line in text.lines() {
        let line = line.trim();
        let len = line.chars().count();
        if len == 0 {
            continue;
        }
        let lowered = line.to_lowercase();
        if POSITIVE.is_match(&lowered) {
            if len > 20 {
                positive.push(line.to_string());
            }
        } else if IMPROVEMENT.is_match(&lowered) {
            if len > 20 {
                improvement.push(line.to_string());
            }
        } else if IMPROVED_LINE.is_match(&lowered) && len > 30 {
            improved = Some(line.to_string());
        }
    }

    (positive, improvement, improved)
}

/// First `max` chars of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Parse a completion into an [`Evaluation`], filling empty sections with
/// encouraging defaults and the improved answer from `context`.
pub fn parse_evaluation(text: &str, context: &str) -> Evaluation {
    let sections = split_sections(text);
    let needs_heuristics = sections.correct.is_none()
        || sections.missing.is_none()
        || sections.improved.is_none();
    let (positive, improvement, improved_line) = if needs_heuristics {
        heuristic_lines(text)
    } else {
        (Vec::new(), Vec::new(), None)
    };

    let score = sections
        .score
        .flatten()
        .or_else(|| heuristic_score(text))
        .unwrap_or(i64::from(DEFAULT_SCORE));

    let mut correct = sections.correct.unwrap_or(positive);
    if correct.is_empty() {
        correct.push(DEFAULT_CORRECT.to_string());
    }

    let mut missing = sections.missing.unwrap_or(improvement);
    if missing.is_empty() {
        missing.push(DEFAULT_MISSING.to_string());
    }

    let improved = match sections.improved {
        Some(lines) => lines.join("\n").trim().to_string(),
        None => improved_line.unwrap_or_default(),
    };
    let improved = if improved.is_empty() {
        format!("{IMPROVED_PREFIX}{}", truncate_chars(context, MAX_IMPROVED_CHARS))
    } else {
        improved
    };

    Evaluation::new(score, correct, missing, &improved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const STRICT: &str = "SCORE: 8\n\n\
        CORRECT POINTS:\n\
        - Identified chlorophyll as the pigment\n\
        - Mentioned sunlight\n\n\
        MISSING POINTS:\n\
        - Did not mention carbon dioxide\n\n\
        IMPROVED ANSWER:\n\
        Plants use chlorophyll to capture sunlight.\n\
        They combine water and carbon dioxide into glucose.";

    #[test]
    fn test_strict_format() {
        let eval = parse_evaluation(STRICT, "ctx");
        assert_eq!(eval.score, 8);
        assert_eq!(
            eval.correct_points,
            vec!["Identified chlorophyll as the pigment", "Mentioned sunlight"]
        );
        assert_eq!(eval.missing_points, vec!["Did not mention carbon dioxide"]);
        assert_eq!(
            eval.improved_answer,
            "Plants use chlorophyll to capture sunlight.\nThey combine water and carbon dioxide into glucose."
        );
    }

    #[test]
    fn test_markdown_headers_and_bullet_styles() {
        let text = "**Score:** 6/10\n\
            ## Correct Points\n\
            1. Named the organelle\n\
            \u{2022} Gave its function\n\
            **MISSING POINTS:**\n\
            * No example\n\
            2) Vague wording\n\
            **Improved Answer:** The mitochondria makes ATP.";
        let eval = parse_evaluation(text, "ctx");
        assert_eq!(eval.score, 6);
        assert_eq!(eval.correct_points, vec!["Named the organelle", "Gave its function"]);
        assert_eq!(eval.missing_points, vec!["No example", "Vague wording"]);
        assert_eq!(eval.improved_answer, "The mitochondria makes ATP.");
    }

    #[test]
    fn test_points_capped_at_three() {
        let text = "SCORE: 9\nCORRECT POINTS:\n- a\n- b\n- c\n- d\n- e\nMISSING POINTS:\n- x\nIMPROVED ANSWER:\nfine";
        let eval = parse_evaluation(text, "");
        assert_eq!(eval.correct_points, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_score_clamped() {
        let high = parse_evaluation("SCORE: 42\nCORRECT POINTS:\nMISSING POINTS:\nIMPROVED ANSWER:", "");
        assert_eq!(high.score, 10);
        let low = parse_evaluation("SCORE: 0\nCORRECT POINTS:\nMISSING POINTS:\nIMPROVED ANSWER:", "");
        assert_eq!(low.score, 1);
    }

    #[test]
    fn test_improved_answer_truncated_on_char_boundary() {
        let long = "é".repeat(600);
        let text = format!("SCORE: 7\nCORRECT POINTS:\n- ok\nMISSING POINTS:\n- more\nIMPROVED ANSWER:\n{long}");
        let eval = parse_evaluation(&text, "");
        assert_eq!(eval.improved_answer.chars().count(), MAX_IMPROVED_CHARS);
    }

    #[test]
    fn test_heuristic_score_phrasings() {
        assert_eq!(parse_evaluation("I'd give this 7 out of 10.", "").score, 7);
        assert_eq!(parse_evaluation("Overall: 4/10, keep going", "").score, 4);
        assert_eq!(parse_evaluation("I would rate: 9", "").score, 9);
        assert_eq!(parse_evaluation("Nothing numeric here", "").score, DEFAULT_SCORE);
    }

    #[test]
    fn test_heuristic_points_by_keyword() {
        let text = "Nice start! Your answer gets 7/10.\n\
            You correctly identified the main pigment involved.\n\
            You should explain where the glucose ends up.\n\
            A fuller explanation would cover the Calvin cycle in the stroma.";
        let eval = parse_evaluation(text, "ctx");
        assert_eq!(eval.score, 7);
        assert!(eval.correct_points[0].contains("correctly identified") || eval.correct_points[0].contains("Nice start"));
        assert_eq!(eval.missing_points, vec!["You should explain where the glucose ends up."]);
        assert_eq!(
            eval.improved_answer,
            "A fuller explanation would cover the Calvin cycle in the stroma."
        );
    }

    #[test]
    fn test_defaults_for_empty_sections() {
        let eval = parse_evaluation("SCORE: 5\nCORRECT POINTS:\nMISSING POINTS:\nIMPROVED ANSWER:", "The cell is the unit of life.");
        assert_eq!(eval.correct_points, vec![DEFAULT_CORRECT]);
        assert_eq!(eval.missing_points, vec![DEFAULT_MISSING]);
        assert_eq!(
            eval.improved_answer,
            "Here's what the document says: The cell is the unit of life."
        );
    }

    #[test]
    fn test_unparsable_text_still_well_formed() {
        let eval = parse_evaluation("¯\\_(ツ)_/¯", &"x".repeat(2000));
        assert!((1..=10).contains(&eval.score));
        assert!(!eval.correct_points.is_empty());
        assert!(!eval.missing_points.is_empty());
        assert!(eval.improved_answer.chars().count() <= MAX_IMPROVED_CHARS);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ñañaña", 2), "ña");
    }
}
