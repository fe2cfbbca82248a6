//! Core trait definitions for AI feedback scorers.
//!
//! Implemented by the `grader-providers` crate.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AnswerSubmission, QuestionType};
use crate::normalize::RawFeedback;

/// Trait for AI backends that grade a single answer.
///
/// Implementations return whatever the model produced; the engine runs it
/// through the normalizer, so partial or malformed output is fine. Failures
/// should be `ScorerError`s wrapped in `anyhow` so the engine can classify
/// them for retries.
#[async_trait]
pub trait FeedbackScorer: Send + Sync {
    /// Human-readable scorer name (e.g. "openai").
    fn name(&self) -> &str;

    /// Request feedback for one answer.
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<RawFeedback>;
}

/// Request for feedback on one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Question the answer belongs to, for logging.
    pub question_id: String,
    /// Whether the coding metric groups should be requested.
    pub is_coding: bool,
    pub system_prompt: String,
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl ScoreRequest {
    /// Build a request with the default system prompt and sampling settings.
    pub fn for_answer(answer: &AnswerSubmission) -> Self {
        Self {
            question_id: answer.question_id.clone(),
            is_coding: answer.question_type.is_coding(),
            system_prompt: EVALUATION_SYSTEM_PROMPT.to_string(),
            prompt: build_evaluation_prompt(answer),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

/// System prompt for interview feedback scorers.
pub const EVALUATION_SYSTEM_PROMPT: &str = "You are an experienced technical interviewer. \
Evaluate the candidate's answer and respond ONLY with a JSON object. Scores are integers: \
\"score\" from 0 to 100, every other metric from 1 to 10. Be specific and constructive.";

const BASE_FIELDS: &str = r#"  "score": <0-100>,
  "strengths": [<string>, ...],
  "improvements": [<string>, ...],
  "detailedAnalysis": <string>,
  "overallAssessment": <string>,
  "communicationClarity": <1-10>,
  "technicalAccuracy": <1-10>,
  "questionRelevance": <1-10>"#;

const CODING_FIELDS: &str = r#",
  "codeMetrics": {"syntaxCorrectness", "logicalFlow", "efficiency", "readability", "bestPractices"},
  "algorithmicThinking": {"problemDecomposition", "patternRecognition", "algorithmDesign", "complexityAnalysis", "edgeCaseHandling"},
  "codeQuality": {"maintainability", "modularity", "errorHandling", "documentation", "testability"}"#;

/// Render the user prompt for one answer.
pub fn build_evaluation_prompt(answer: &AnswerSubmission) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Question type: {}", answer.question_type);
    if let Some(difficulty) = answer.difficulty {
        let _ = writeln!(prompt, "Difficulty: {difficulty}");
    }
    if let Some(question) = answer.question.as_deref().filter(|q| !q.trim().is_empty()) {
        let _ = writeln!(prompt, "\nQuestion:\n{}", question.trim());
    }

    let text = answer.response_text.trim();
    if !text.is_empty() {
        let _ = writeln!(prompt, "\nCandidate answer:\n{text}");
    }

    if answer.question_type == QuestionType::Coding {
        let language = answer.language.as_deref().unwrap_or("");
        let code = answer.code.as_deref().unwrap_or("").trim_end();
        let _ = writeln!(prompt, "\nSubmitted code:\n```{language}\n{code}\n```");
        if let Some(run) = &answer.execution_result {
            if let Some(error) = run.error_text() {
                let _ = writeln!(prompt, "\nExecution failed with:\n{error}");
            } else if let Some(output) = run.output_text() {
                let _ = writeln!(prompt, "\nExecution output:\n{output}");
            }
        }
    }

    let _ = write!(prompt, "\nRespond with JSON in this shape:\n{{\n{BASE_FIELDS}");
    if answer.question_type.is_coding() {
        prompt.push_str(CODING_FIELDS);
    }
    prompt.push_str("\n}\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExecutionResult;

    #[test]
    fn technical_prompt_has_no_code_section() {
        let mut answer = AnswerSubmission::new(
            "q1",
            QuestionType::Technical,
            "An index trades write speed for read speed.",
        );
        answer.question = Some("What does a database index do?".into());
        let prompt = build_evaluation_prompt(&answer);
        assert!(prompt.contains("Question type: technical"));
        assert!(prompt.contains("What does a database index do?"));
        assert!(prompt.contains("An index trades write speed"));
        assert!(!prompt.contains("Submitted code"));
        assert!(!prompt.contains("codeMetrics"));
    }

    #[test]
    fn coding_prompt_includes_code_and_execution() {
        let mut answer = AnswerSubmission::new("q2", QuestionType::Coding, "");
        answer.code = Some("def add(a, b):\n    return a + b\n".into());
        answer.language = Some("python".into());
        answer.execution_result = Some(ExecutionResult {
            error: Some("NameError: name 'ad' is not defined".into()),
            ..Default::default()
        });
        let prompt = build_evaluation_prompt(&answer);
        assert!(prompt.contains("```python\ndef add(a, b):"));
        assert!(prompt.contains("Execution failed with:\nNameError"));
        assert!(prompt.contains("\"algorithmicThinking\""));
        assert!(!prompt.contains("Candidate answer"));
    }

    #[test]
    fn request_defaults() {
        let answer = AnswerSubmission::new("q3", QuestionType::Coding, "");
        let request = ScoreRequest::for_answer(&answer);
        assert_eq!(request.question_id, "q3");
        assert!(request.is_coding);
        assert_eq!(request.system_prompt, EVALUATION_SYSTEM_PROMPT);
        assert_eq!(request.temperature, 0.0);
    }
}
