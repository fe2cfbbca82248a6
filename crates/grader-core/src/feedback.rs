//! Canonical feedback schema.
//!
//! Every feedback record that leaves the core, whether produced by an AI
//! scorer or by the heuristic fallback, has exactly this shape: integer
//! score in `[0, 100]`, sub-metrics in `[1, 10]`, no missing fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest value a 1-10 sub-metric may take.
pub const METRIC_MIN: u8 = 1;
/// Highest value a 1-10 sub-metric may take.
pub const METRIC_MAX: u8 = 10;
/// Value used for a 1-10 sub-metric nobody reported.
pub const METRIC_DEFAULT: u8 = 5;
/// Score used when feedback carries no usable score.
pub const SCORE_DEFAULT: u8 = 50;

/// Clamp a raw sub-metric into `[1, 10]`.
pub fn clamp_metric(value: i64) -> u8 {
    value.clamp(METRIC_MIN as i64, METRIC_MAX as i64) as u8
}

/// Clamp a raw score into `[0, 100]`.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Ordered relevance category, derived purely from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseType {
    CompletelyOffTopic,
    MostlyIrrelevant,
    PartiallyRelevant,
    MostlyRelevant,
    PerfectlyRelevant,
}

impl ResponseType {
    /// Step function over the score; a boundary value belongs to the higher
    /// category.
    pub fn from_score(score: u8) -> ResponseType {
        match score {
            85.. => ResponseType::PerfectlyRelevant,
            65.. => ResponseType::MostlyRelevant,
            45.. => ResponseType::PartiallyRelevant,
            25.. => ResponseType::MostlyIrrelevant,
            _ => ResponseType::CompletelyOffTopic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::CompletelyOffTopic => "completely-off-topic",
            ResponseType::MostlyIrrelevant => "mostly-irrelevant",
            ResponseType::PartiallyRelevant => "partially-relevant",
            ResponseType::MostlyRelevant => "mostly-relevant",
            ResponseType::PerfectlyRelevant => "perfectly-relevant",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code-level quality sub-scores (1-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    pub syntax_correctness: u8,
    pub logical_flow: u8,
    pub efficiency: u8,
    pub readability: u8,
    pub best_practices: u8,
}

/// Problem-solving sub-scores (1-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmicThinking {
    pub problem_decomposition: u8,
    pub pattern_recognition: u8,
    pub algorithm_design: u8,
    pub complexity_analysis: u8,
    pub edge_case_handling: u8,
}

/// Engineering-quality sub-scores (1-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeQuality {
    pub maintainability: u8,
    pub modularity: u8,
    pub error_handling: u8,
    pub documentation: u8,
    pub testability: u8,
}

impl Default for CodeMetrics {
    fn default() -> Self {
        Self {
            syntax_correctness: METRIC_DEFAULT,
            logical_flow: METRIC_DEFAULT,
            efficiency: METRIC_DEFAULT,
            readability: METRIC_DEFAULT,
            best_practices: METRIC_DEFAULT,
        }
    }
}

impl Default for AlgorithmicThinking {
    fn default() -> Self {
        Self {
            problem_decomposition: METRIC_DEFAULT,
            pattern_recognition: METRIC_DEFAULT,
            algorithm_design: METRIC_DEFAULT,
            complexity_analysis: METRIC_DEFAULT,
            edge_case_handling: METRIC_DEFAULT,
        }
    }
}

impl Default for CodeQuality {
    fn default() -> Self {
        Self {
            maintainability: METRIC_DEFAULT,
            modularity: METRIC_DEFAULT,
            error_handling: METRIC_DEFAULT,
            documentation: METRIC_DEFAULT,
            testability: METRIC_DEFAULT,
        }
    }
}

/// Canonical scoring output for one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Overall score, 0-100.
    pub score: u8,
    /// Relevance bucket for `score`.
    pub response_type: ResponseType,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub detailed_analysis: String,
    /// One-line verdict. Empty when the source gave none.
    #[serde(default)]
    pub overall_assessment: String,
    pub communication_clarity: u8,
    pub technical_accuracy: u8,
    pub question_relevance: u8,
    /// Present for coding questions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_metrics: Option<CodeMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithmic_thinking: Option<AlgorithmicThinking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<CodeQuality>,
}

impl FeedbackRecord {
    /// The fixed zero-score, zero-effort record attached to skipped answers.
    pub fn skipped() -> Self {
        Self {
            score: 0,
            response_type: ResponseType::CompletelyOffTopic,
            strengths: Vec::new(),
            improvements: vec!["Attempt the question to receive feedback".to_string()],
            detailed_analysis: "The question was skipped, so no answer was evaluated.".to_string(),
            overall_assessment: "Skipped".to_string(),
            communication_clarity: METRIC_MIN,
            technical_accuracy: METRIC_MIN,
            question_relevance: METRIC_MIN,
            code_metrics: None,
            algorithmic_thinking: None,
            code_quality: None,
        }
    }

    /// Minimal record for an answer rejected before scoring.
    pub fn insufficient(reason: &str) -> Self {
        Self {
            score: 0,
            response_type: ResponseType::CompletelyOffTopic,
            strengths: Vec::new(),
            improvements: vec![
                "Provide a complete, substantive answer to the question".to_string(),
                format!("Answer was not scored: {reason}"),
            ],
            detailed_analysis: format!(
                "The response was not substantive enough to evaluate ({reason})."
            ),
            overall_assessment: "Insufficient response".to_string(),
            communication_clarity: METRIC_MIN,
            technical_accuracy: METRIC_MIN,
            question_relevance: METRIC_MIN,
            code_metrics: None,
            algorithmic_thinking: None,
            code_quality: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_type_thresholds() {
        assert_eq!(ResponseType::from_score(85), ResponseType::PerfectlyRelevant);
        assert_eq!(ResponseType::from_score(65), ResponseType::MostlyRelevant);
        assert_eq!(ResponseType::from_score(45), ResponseType::PartiallyRelevant);
        assert_eq!(ResponseType::from_score(25), ResponseType::MostlyIrrelevant);
        assert_eq!(ResponseType::from_score(0), ResponseType::CompletelyOffTopic);
    }

    #[test]
    fn response_type_just_below_boundaries() {
        assert_eq!(ResponseType::from_score(84), ResponseType::MostlyRelevant);
        assert_eq!(ResponseType::from_score(64), ResponseType::PartiallyRelevant);
        assert_eq!(ResponseType::from_score(44), ResponseType::MostlyIrrelevant);
        assert_eq!(ResponseType::from_score(24), ResponseType::CompletelyOffTopic);
        assert_eq!(ResponseType::from_score(100), ResponseType::PerfectlyRelevant);
    }

    #[test]
    fn response_type_is_ordered() {
        assert!(ResponseType::PerfectlyRelevant > ResponseType::MostlyRelevant);
        assert!(ResponseType::MostlyIrrelevant > ResponseType::CompletelyOffTopic);
    }

    #[test]
    fn response_type_wire_format() {
        let json = serde_json::to_string(&ResponseType::MostlyIrrelevant).unwrap();
        assert_eq!(json, "\"mostly-irrelevant\"");
        assert_eq!(ResponseType::PartiallyRelevant.to_string(), "partially-relevant");
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_metric(0), 1);
        assert_eq!(clamp_metric(42), 10);
        assert_eq!(clamp_metric(7), 7);
        assert_eq!(clamp_score(-3), 0);
        assert_eq!(clamp_score(250), 100);
    }

    #[test]
    fn skipped_record_is_zero_effort() {
        let record = FeedbackRecord::skipped();
        assert_eq!(record.score, 0);
        assert_eq!(record.response_type, ResponseType::CompletelyOffTopic);
        assert!(record.strengths.is_empty());
        assert_eq!(record.communication_clarity, METRIC_MIN);
        assert!(record.code_metrics.is_none());
    }

    #[test]
    fn feedback_wire_names_are_camel_case() {
        let value = serde_json::to_value(FeedbackRecord::skipped()).unwrap();
        assert!(value.get("responseType").is_some());
        assert!(value.get("communicationClarity").is_some());
        assert!(value.get("codeMetrics").is_none());
    }
}
