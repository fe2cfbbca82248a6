//! Answer gate.
//!
//! Decides whether a raw response is substantive enough to be scored at
//! all. Pure predicate, no side effects.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::QuestionType;

/// Minimum length of non-comment code.
pub const MIN_CODE_CHARS: usize = 20;
/// Minimum length of a prose answer.
pub const MIN_TEXT_CHARS: usize = 20;
/// Minimum number of whitespace-delimited words in a prose answer.
pub const MIN_TEXT_WORDS: usize = 5;

/// Canned non-answers, compared case-insensitively after trimming.
pub const NON_ANSWERS: &[&str] = &[
    "i don't know",
    "no idea",
    "not sure",
    "pass",
    "skip",
    "i have no idea",
    "don't know",
    "no clue",
    "nothing",
];

const CODE_OPERATORS: &[char] = &[
    '{', '}', '(', ')', ';', '=', '+', '-', '*', '/', '>', '<', '%',
];

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(//|#).*$").expect("valid regex"));

/// Why an answer was not accepted for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyCode,
    CodeTooShort { chars: usize },
    NoCodeOperators,
    EmptyText,
    TextTooShort { chars: usize },
    TooFewWords { words: usize },
    NonAnswer,
    Repetitive { word: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyCode => write!(f, "no code submitted"),
            RejectReason::CodeTooShort { chars } => write!(
                f,
                "only {chars} characters of code outside comments (minimum {MIN_CODE_CHARS})"
            ),
            RejectReason::NoCodeOperators => {
                write!(f, "code contains no operators, brackets or statements")
            }
            RejectReason::EmptyText => write!(f, "empty response"),
            RejectReason::TextTooShort { chars } => {
                write!(f, "response is {chars} characters (minimum {MIN_TEXT_CHARS})")
            }
            RejectReason::TooFewWords { words } => {
                write!(f, "response has {words} words (minimum {MIN_TEXT_WORDS})")
            }
            RejectReason::NonAnswer => write!(f, "response is a non-answer"),
            RejectReason::Repetitive { word } => {
                write!(f, "response is dominated by the word \"{word}\"")
            }
        }
    }
}

/// Outcome of gating one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Accepted,
    Rejected(RejectReason),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted)
    }
}

/// Returns `true` when the answer is meaningful enough to score.
pub fn is_valid_answer(
    response_text: &str,
    question_type: QuestionType,
    code: Option<&str>,
) -> bool {
    assess_answer(response_text, question_type, code).is_accepted()
}

/// Gate an answer and report the first rule it fails.
pub fn assess_answer(
    response_text: &str,
    question_type: QuestionType,
    code: Option<&str>,
) -> GateVerdict {
    let verdict = match question_type {
        QuestionType::Coding => assess_code(code.unwrap_or_default()),
        QuestionType::Behavioral | QuestionType::Technical => assess_text(response_text),
    };
    if let GateVerdict::Rejected(reason) = &verdict {
        tracing::debug!(%question_type, %reason, "answer rejected by gate");
    }
    verdict
}

/// Remove `/* */`, `//` and `#` comments from source text.
pub fn strip_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(code, "");
    LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

fn assess_code(code: &str) -> GateVerdict {
    if code.trim().is_empty() {
        return GateVerdict::Rejected(RejectReason::EmptyCode);
    }

    let stripped = strip_comments(code);
    let chars = stripped.trim().chars().count();
    if chars < MIN_CODE_CHARS {
        return GateVerdict::Rejected(RejectReason::CodeTooShort { chars });
    }

    if !stripped.contains(CODE_OPERATORS) {
        return GateVerdict::Rejected(RejectReason::NoCodeOperators);
    }

    GateVerdict::Accepted
}

fn assess_text(text: &str) -> GateVerdict {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return GateVerdict::Rejected(RejectReason::EmptyText);
    }

    let lowered = trimmed.to_lowercase();
    if NON_ANSWERS.contains(&lowered.as_str()) {
        return GateVerdict::Rejected(RejectReason::NonAnswer);
    }

    let chars = trimmed.chars().count();
    if chars < MIN_TEXT_CHARS {
        return GateVerdict::Rejected(RejectReason::TextTooShort { chars });
    }

    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.len() < MIN_TEXT_WORDS {
        return GateVerdict::Rejected(RejectReason::TooFewWords { words: words.len() });
    }

    if let Some(word) = dominant_word(&words) {
        return GateVerdict::Rejected(RejectReason::Repetitive { word });
    }

    GateVerdict::Accepted
}

/// The word whose frequency exceeds half the word count, if there is one.
fn dominant_word(words: &[&str]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        *counts.entry(word).or_default() += 1;
    }
    counts
        .into_iter()
        .find(|(_, count)| count * 2 > words.len())
        .map(|(word, _)| word.to_string())
}
