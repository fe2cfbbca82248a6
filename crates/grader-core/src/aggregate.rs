//! Session-level aggregation.
//!
//! Folds per-question feedback into the interview summary: an overall
//! score, per-category percentages and a breakdown of what was answered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EvalError;
use crate::feedback::FeedbackRecord;
use crate::model::QuestionType;
use crate::results::EvaluatedAnswer;

/// Percentages (0-100) per question category and per soft metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPercentages {
    pub behavioral: u8,
    pub technical: u8,
    pub coding: u8,
    /// Mean `communicationClarity`, scaled to 0-100.
    pub communication: u8,
    /// Mean `technicalAccuracy`, scaled to 0-100.
    pub technical_accuracy: u8,
    /// Mean of the `coding` and `technical` percentages.
    pub problem_solving: u8,
}

impl CategoryPercentages {
    /// Label/value pairs in display order.
    pub fn entries(&self) -> [(&'static str, u8); 6] {
        [
            ("behavioral", self.behavioral),
            ("technical", self.technical),
            ("coding", self.coding),
            ("communication", self.communication),
            ("technicalAccuracy", self.technical_accuracy),
            ("problemSolving", self.problem_solving),
        ]
    }
}

/// Question counts for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub skipped_questions: usize,
    /// Not skipped but carrying no feedback. Excluded from every mean.
    #[serde(default)]
    pub unscored_questions: usize,
    pub behavioral_questions: usize,
    pub technical_questions: usize,
    pub coding_questions: usize,
    /// Mean response time in seconds over answered questions.
    pub average_response_time: u64,
}

/// Aggregate over all answers of one interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Mean score of answered questions, 0 when none were answered.
    pub score: u8,
    pub category_percentages: CategoryPercentages,
    pub breakdown: Breakdown,
    /// Interview length in seconds, as supplied by the caller.
    pub total_duration: u64,
}

/// Aggregate evaluated answers into a session summary.
pub fn calculate_final_results(
    responses: &[EvaluatedAnswer],
    total_duration_secs: u64,
) -> SessionSummary {
    let answered: Vec<(&EvaluatedAnswer, &FeedbackRecord)> = responses
        .iter()
        .filter_map(|r| r.answered_feedback().map(|f| (r, f)))
        .collect();

    let count_type = |qt: QuestionType| {
        responses
            .iter()
            .filter(|r| r.submission.question_type == qt)
            .count()
    };

    let skipped = responses.iter().filter(|r| r.submission.skipped).count();
    let unscored = responses.len() - answered.len() - skipped;
    if unscored > 0 {
        tracing::warn!(unscored, "answers without feedback left out of the summary");
    }

    let mut breakdown = Breakdown {
        total_questions: responses.len(),
        answered_questions: answered.len(),
        skipped_questions: skipped,
        unscored_questions: unscored,
        behavioral_questions: count_type(QuestionType::Behavioral),
        technical_questions: count_type(QuestionType::Technical),
        coding_questions: count_type(QuestionType::Coding),
        average_response_time: 0,
    };

    if answered.is_empty() {
        tracing::debug!(total = responses.len(), "no answered questions to aggregate");
        return SessionSummary {
            score: 0,
            category_percentages: CategoryPercentages::default(),
            breakdown,
            total_duration: total_duration_secs,
        };
    }

    let score = rounded_mean(answered.iter().map(|(_, f)| f64::from(f.score))).unwrap_or(0);

    // A category nobody answered reports the overall score rather than 0.
    let category = |qt: QuestionType| {
        rounded_mean(
            answered
                .iter()
                .filter(|(r, _)| r.submission.question_type == qt)
                .map(|(_, f)| f64::from(f.score)),
        )
        .unwrap_or(score)
    };
    let behavioral = category(QuestionType::Behavioral);
    let technical = category(QuestionType::Technical);
    let coding = category(QuestionType::Coding);

    let communication = rounded_mean(
        answered
            .iter()
            .map(|(_, f)| f64::from(f.communication_clarity) * 10.0),
    )
    .unwrap_or(0);
    let technical_accuracy = rounded_mean(
        answered
            .iter()
            .map(|(_, f)| f64::from(f.technical_accuracy) * 10.0),
    )
    .unwrap_or(0);
    let problem_solving = round_percent((f64::from(coding) + f64::from(technical)) / 2.0);

    let total_response_time: u64 = answered.iter().map(|(r, _)| r.submission.response_time).sum();
    breakdown.average_response_time =
        (total_response_time as f64 / answered.len() as f64).round() as u64;

    tracing::debug!(
        score,
        answered = breakdown.answered_questions,
        skipped = breakdown.skipped_questions,
        "session aggregated"
    );

    SessionSummary {
        score,
        category_percentages: CategoryPercentages {
            behavioral,
            technical,
            coding,
            communication,
            technical_accuracy,
            problem_solving,
        },
        breakdown,
        total_duration: total_duration_secs,
    }
}

/// Aggregate a loosely-typed response list, such as a request body.
///
/// Fails fast when `responses` is not an array or its elements are not
/// evaluated answers.
pub fn calculate_final_results_value(
    responses: &Value,
    total_duration_secs: u64,
) -> Result<SessionSummary, EvalError> {
    if !responses.is_array() {
        return Err(EvalError::InvalidInput(format!(
            "responses must be an array, got {}",
            json_kind(responses)
        )));
    }
    let parsed: Vec<EvaluatedAnswer> = serde_json::from_value(responses.clone())
        .map_err(|e| EvalError::InvalidInput(format!("malformed response entry: {e}")))?;
    Ok(calculate_final_results(&parsed, total_duration_secs))
}

fn rounded_mean(values: impl Iterator<Item = f64>) -> Option<u8> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| round_percent(sum / n as f64))
}

fn round_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
