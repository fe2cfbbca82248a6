//! Core data model types for grader.
//!
//! These are the input-side types: the question categories, the candidate's
//! submitted answers, and the interview session that groups them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// The closed set of question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Behavioral,
    Technical,
    Coding,
}

/// Free-form question type spellings and the category each maps to.
///
/// Keys are compared after lowercasing, trimming, and folding `_` and
/// spaces to `-`.
pub const QUESTION_TYPE_ALIASES: &[(&str, QuestionType)] = &[
    ("behavioral", QuestionType::Behavioral),
    ("behavioural", QuestionType::Behavioral),
    ("behavior", QuestionType::Behavioral),
    ("behaviour", QuestionType::Behavioral),
    ("hr", QuestionType::Behavioral),
    ("situational", QuestionType::Behavioral),
    ("soft-skills", QuestionType::Behavioral),
    ("technical", QuestionType::Technical),
    ("tech", QuestionType::Technical),
    ("conceptual", QuestionType::Technical),
    ("theory", QuestionType::Technical),
    ("system-design", QuestionType::Technical),
    ("coding", QuestionType::Coding),
    ("code", QuestionType::Coding),
    ("programming", QuestionType::Coding),
    ("problem-solving", QuestionType::Coding),
    ("algorithm", QuestionType::Coding),
    ("algorithms", QuestionType::Coding),
    ("dsa", QuestionType::Coding),
    ("live-coding", QuestionType::Coding),
];

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::Behavioral,
        QuestionType::Technical,
        QuestionType::Coding,
    ];

    /// Map a free-form type string onto the closed set.
    ///
    /// Unrecognized input maps to `Technical`.
    pub fn normalize(raw: &str) -> QuestionType {
        Self::lookup(raw).unwrap_or(QuestionType::Technical)
    }

    /// Look up a free-form type string, returning `None` when it is not in
    /// the alias table.
    pub fn lookup(raw: &str) -> Option<QuestionType> {
        let key = raw.trim().to_lowercase().replace(['_', ' '], "-");
        QUESTION_TYPE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, qt)| *qt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Behavioral => "behavioral",
            QuestionType::Technical => "technical",
            QuestionType::Coding => "coding",
        }
    }

    pub fn is_coding(&self) -> bool {
        matches!(self, QuestionType::Coding)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Strict parse: only spellings present in the alias table are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::lookup(s).ok_or_else(|| format!("unknown question type: {s}"))
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(QuestionType::normalize(&raw))
    }
}

/// Question difficulty, carried as read-only metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "intermediate" => Ok(Difficulty::Medium),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Result reported by the external code-execution service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured stdout.
    #[serde(default)]
    pub output: Option<String>,
    /// Compile or runtime error text.
    #[serde(default)]
    pub error: Option<String>,
    /// Wall-clock execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
    /// Peak memory in kilobytes.
    #[serde(default)]
    pub memory_kb: Option<u64>,
}

impl ExecutionResult {
    /// Non-empty error text, if any.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Non-empty output text, if any.
    pub fn output_text(&self) -> Option<&str> {
        self.output.as_deref().map(str::trim).filter(|o| !o.is_empty())
    }
}

/// One candidate response to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Opaque question identifier.
    pub question_id: String,
    /// Question category, normalized on deserialization.
    pub question_type: QuestionType,
    /// The question as it was asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Free-text answer. May be empty for coding answers.
    #[serde(default)]
    pub response_text: String,
    /// Submitted source code (coding questions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Language of `code`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub skipped: bool,
    /// Seconds spent answering.
    #[serde(default)]
    pub response_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<ExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Starter code offered to the candidate, keyed by language.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub starter_code: HashMap<String, String>,
    /// AI feedback captured earlier, as a string or a structured object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_feedback: Option<serde_json::Value>,
}

impl AnswerSubmission {
    /// Minimal answered submission, mostly useful in tests and tooling.
    pub fn new(question_id: &str, question_type: QuestionType, response_text: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            question_type,
            question: None,
            response_text: response_text.to_string(),
            code: None,
            language: None,
            skipped: false,
            response_time: 0,
            execution_result: None,
            difficulty: None,
            starter_code: HashMap::new(),
            recorded_feedback: None,
        }
    }

    /// Starter code for the submission's language, if one was offered.
    pub fn starter_code_for_language(&self) -> Option<&str> {
        let language = self.language.as_deref()?.to_lowercase();
        self.starter_code
            .iter()
            .find(|(lang, _)| lang.to_lowercase() == language)
            .map(|(_, code)| code.as_str())
    }
}

/// All answers from one interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    /// Unique identifier for this session.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Candidate identifier, used as the rate-limit key for AI scoring.
    #[serde(default)]
    pub candidate_id: Option<String>,
    /// Length of the interview in seconds.
    #[serde(default)]
    pub total_duration_secs: u64,
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
}
