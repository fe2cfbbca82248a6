//! Heuristic analysis of technical and behavioral prose.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::feedback::ResponseType;

/// Technical answers shorter than this are not analyzed.
pub const MIN_TECHNICAL_CHARS: usize = 50;
/// Behavioral answers shorter than this are not analyzed.
pub const MIN_BEHAVIORAL_CHARS: usize = 100;
pub const DEGENERATE_TECHNICAL_SCORE: u8 = 10;
pub const DEGENERATE_BEHAVIORAL_SCORE: u8 = 15;

const TECHNICAL_BASE: u32 = 20;
const TECHNICAL_DETAILED_BASE: u32 = 50;
const TECHNICAL_DETAILED_CHARS: usize = 150;
const TERMINOLOGY_POINTS: u32 = 15;
const EXAMPLE_POINTS: u32 = 10;
const REASONING_POINTS: u32 = 10;

const STAR_STRONG_SCORE: u8 = 60;
const STAR_WEAK_SCORE: u8 = 35;

static TERMINOLOGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(algorithms?|databases?|apis?|frameworks?|librar(y|ies)|functions?|variables?|arrays?|objects?|servers?|clients?|http|json|sql)\b",
    )
    .expect("valid regex")
});
static EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(for example|such as|example|like)\b").expect("valid regex")
});
static REASONING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(because|therefore|thus|since|reason|due to)\b").expect("valid regex")
});

static SITUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(situation|when i was|at my (previous|last|current|old) (job|company|role|team)|in my (previous|last|current) (job|role|position)|we were|the project|our team|there was a)\b",
    )
    .expect("valid regex")
});
static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bi (led|built|designed|implemented|created|developed|decided|organized|managed|took|worked|wrote|started|proposed|analyzed|coordinated|set up|reached out|talked|negotiated|refactored|introduced)\b",
    )
    .expect("valid regex")
});
static RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(result|results|resulted|outcome|as a result|achieved|improved|increased|reduced|delivered|successfully|impact|learned|saved)\b",
    )
    .expect("valid regex")
});

/// Score and feedback lists for one prose answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub response_type: ResponseType,
}

impl TextAnalysis {
    fn new(score: u8, strengths: Vec<String>, improvements: Vec<String>) -> Self {
        Self {
            score,
            strengths,
            improvements,
            response_type: ResponseType::from_score(score),
        }
    }
}

/// STAR signals detected in a behavioral answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarSignals {
    pub situation: bool,
    pub action: bool,
    pub result: bool,
}

impl StarSignals {
    pub fn detect(text: &str) -> Self {
        Self {
            situation: SITUATION.is_match(text),
            action: ACTION.is_match(text),
            result: RESULT.is_match(text),
        }
    }

    pub fn count(&self) -> usize {
        [self.situation, self.action, self.result]
            .iter()
            .filter(|&&present| present)
            .count()
    }
}

/// Analyze an answer to a technical question.
pub fn analyze_technical(text: &str) -> TextAnalysis {
    let text = text.trim();
    let chars = text.chars().count();
    if chars < MIN_TECHNICAL_CHARS {
        return TextAnalysis::new(
            DEGENERATE_TECHNICAL_SCORE,
            vec!["Attempted to answer the question".to_string()],
            vec![
                "Provide a more detailed explanation".to_string(),
                "Use specific technical terminology".to_string(),
                "Support the answer with a concrete example".to_string(),
            ],
        );
    }

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    let mut score = if chars >= TECHNICAL_DETAILED_CHARS {
        strengths.push("Gives a reasonably detailed explanation".to_string());
        TECHNICAL_DETAILED_BASE
    } else {
        improvements.push("Expand the explanation with more depth".to_string());
        TECHNICAL_BASE
    };

    if TERMINOLOGY.is_match(text) {
        score += TERMINOLOGY_POINTS;
        strengths.push("Uses appropriate technical terminology".to_string());
    } else {
        improvements.push("Use precise technical terminology".to_string());
    }

    if EXAMPLE.is_match(text) {
        score += EXAMPLE_POINTS;
        strengths.push("Illustrates the answer with examples".to_string());
    } else {
        improvements.push("Add a concrete example to illustrate the concept".to_string());
    }

    if REASONING.is_match(text) {
        score += REASONING_POINTS;
        strengths.push("Explains the reasoning behind the answer".to_string());
    } else {
        improvements.push("Explain why, not just what".to_string());
    }

    let score = score.min(100) as u8;
    tracing::debug!(score, chars, "technical answer analyzed");
    TextAnalysis::new(score, strengths, improvements)
}

/// Analyze an answer to a behavioral question using STAR detection.
pub fn analyze_behavioral(text: &str) -> TextAnalysis {
    let text = text.trim();
    if text.chars().count() < MIN_BEHAVIORAL_CHARS {
        return TextAnalysis::new(
            DEGENERATE_BEHAVIORAL_SCORE,
            vec!["Attempted to answer the question".to_string()],
            vec![
                "Describe a specific situation you were in".to_string(),
                "Explain the actions you personally took".to_string(),
                "Share the outcome and what you learned".to_string(),
            ],
        );
    }

    let star = StarSignals::detect(text);
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    if star.situation {
        strengths.push("Sets up the context of the situation".to_string());
    } else {
        improvements.push("Start by describing the situation and your task".to_string());
    }
    if star.action {
        strengths.push("Describes the specific actions you took".to_string());
    } else {
        improvements.push("Focus on what you did, using \"I\" statements".to_string());
    }
    if star.result {
        strengths.push("Reports a concrete outcome".to_string());
    } else {
        improvements.push("Finish with the result and its impact".to_string());
    }

    let score = if star.count() >= 2 {
        STAR_STRONG_SCORE
    } else {
        STAR_WEAK_SCORE
    };
    if strengths.is_empty() {
        strengths.push("Provides a substantive answer".to_string());
    }
    improvements.push("Quantify the impact where possible".to_string());

    tracing::debug!(score, ?star, "behavioral answer analyzed");
    TextAnalysis::new(score, strengths, improvements)
}
