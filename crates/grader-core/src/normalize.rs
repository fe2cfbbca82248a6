//! Feedback normalizer.
//!
//! Coerces whatever a scorer produced (a structured object, or a string
//! that may have JSON embedded in prose) into a [`FeedbackRecord`] with
//! every field present and every number in range.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::code_analysis::excerpt;
use crate::feedback::{
    clamp_metric, clamp_score, AlgorithmicThinking, CodeMetrics, CodeQuality, FeedbackRecord,
    ResponseType, METRIC_DEFAULT, SCORE_DEFAULT,
};

/// Analysis text used when the source supplied none.
pub const DEFAULT_ANALYSIS: &str = "No detailed analysis provided.";
/// Improvement reported when embedded JSON could not be parsed.
pub const PARSE_FAILED_MESSAGE: &str =
    "Automated feedback could not be parsed; review the raw evaluator notes";

const EXCERPT_CHARS: usize = 200;

/// Feedback as it arrives from a scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeedback {
    /// Free text, possibly with a JSON object embedded in it.
    Text(String),
    /// Already-structured data.
    Structured(Value),
}

impl From<String> for RawFeedback {
    fn from(text: String) -> Self {
        RawFeedback::Text(text)
    }
}

impl From<&str> for RawFeedback {
    fn from(text: &str) -> Self {
        RawFeedback::Text(text.to_string())
    }
}

impl From<Value> for RawFeedback {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawFeedback::Text(text),
            other => RawFeedback::Structured(other),
        }
    }
}

/// Why a text payload could not be read as structured feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No `{...}` span in the text.
    NoJsonFound,
    /// A `{...}` span was found but is not a JSON object.
    InvalidJson(String),
}

/// Result of reading a text payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFeedback {
    Structured(Map<String, Value>),
    Degraded { reason: DegradeReason, raw: String },
}

/// Find the first balanced `{...}` object in `raw` and parse it.
///
/// Each `{` is tried in turn, so braces in surrounding prose neither hide
/// nor swallow the feedback object.
pub fn parse_feedback_text(raw: &str) -> ParsedFeedback {
    let mut first_error = None;

    for (start, _) in raw.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(map))) => return ParsedFeedback::Structured(map),
            Some(Ok(_)) | None => {}
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    let reason = match first_error {
        Some(error) => DegradeReason::InvalidJson(error),
        None => DegradeReason::NoJsonFound,
    };
    ParsedFeedback::Degraded {
        reason,
        raw: raw.to_string(),
    }
}

/// Normalize any feedback payload into the canonical record.
///
/// Coding questions additionally get the three code metric groups, read
/// from nested objects or from flat top-level aliases.
pub fn process_feedback(raw: &RawFeedback, is_coding_question: bool) -> FeedbackRecord {
    match raw {
        RawFeedback::Text(text) => match parse_feedback_text(text) {
            ParsedFeedback::Structured(map) => normalize_map(&map, is_coding_question),
            ParsedFeedback::Degraded { reason, raw } => {
                tracing::warn!(?reason, "feedback text degraded to default record");
                degraded_record(&reason, raw, is_coding_question)
            }
        },
        RawFeedback::Structured(Value::Object(map)) => normalize_map(map, is_coding_question),
        RawFeedback::Structured(Value::String(text)) => {
            process_feedback(&RawFeedback::Text(text.clone()), is_coding_question)
        }
        RawFeedback::Structured(other) => {
            tracing::warn!(kind = value_kind(other), "feedback is not an object; using defaults");
            normalize_map(&Map::new(), is_coding_question)
        }
    }
}

fn degraded_record(reason: &DegradeReason, raw: String, is_coding: bool) -> FeedbackRecord {
    let improvement = match reason {
        DegradeReason::NoJsonFound => excerpt(&raw, EXCERPT_CHARS),
        DegradeReason::InvalidJson(_) => PARSE_FAILED_MESSAGE.to_string(),
    };
    let mut record = normalize_map(&Map::new(), is_coding);
    record.improvements = vec![improvement];
    record.detailed_analysis = raw;
    record
}

fn normalize_map(map: &Map<String, Value>, is_coding: bool) -> FeedbackRecord {
    let score = map
        .get("score")
        .and_then(read_integer)
        .map(clamp_score)
        .unwrap_or(SCORE_DEFAULT);

    let (code_metrics, algorithmic_thinking, code_quality) = if is_coding {
        (
            Some(code_metrics(map)),
            Some(algorithmic_thinking(map)),
            Some(code_quality(map)),
        )
    } else {
        (None, None, None)
    };

    FeedbackRecord {
        score,
        response_type: ResponseType::from_score(score),
        strengths: read_string_list(map.get("strengths")),
        improvements: read_string_list(map.get("improvements")),
        detailed_analysis: read_string(map.get("detailedAnalysis"))
            .unwrap_or_else(|| DEFAULT_ANALYSIS.to_string()),
        overall_assessment: read_string(map.get("overallAssessment")).unwrap_or_default(),
        communication_clarity: top_metric(map, "communicationClarity"),
        technical_accuracy: top_metric(map, "technicalAccuracy"),
        question_relevance: top_metric(map, "questionRelevance"),
        code_metrics,
        algorithmic_thinking,
        code_quality,
    }
}

fn code_metrics(map: &Map<String, Value>) -> CodeMetrics {
    let group = nested(map, "codeMetrics");
    CodeMetrics {
        syntax_correctness: metric(map, group, "syntaxCorrectness", &["syntax"]),
        logical_flow: metric(map, group, "logicalFlow", &["correctness"]),
        efficiency: metric(map, group, "efficiency", &[]),
        readability: metric(map, group, "readability", &["structureAndReadability"]),
        best_practices: metric(map, group, "bestPractices", &["languageBestPractices"]),
    }
}

fn algorithmic_thinking(map: &Map<String, Value>) -> AlgorithmicThinking {
    let group = nested(map, "algorithmicThinking");
    AlgorithmicThinking {
        problem_decomposition: metric(map, group, "problemDecomposition", &[]),
        pattern_recognition: metric(map, group, "patternRecognition", &[]),
        algorithm_design: metric(map, group, "algorithmDesign", &["correctness"]),
        complexity_analysis: metric(map, group, "complexityAnalysis", &["efficiency"]),
        edge_case_handling: metric(map, group, "edgeCaseHandling", &[]),
    }
}

fn code_quality(map: &Map<String, Value>) -> CodeQuality {
    let group = nested(map, "codeQuality");
    CodeQuality {
        maintainability: metric(map, group, "maintainability", &["structureAndReadability"]),
        modularity: metric(map, group, "modularity", &[]),
        error_handling: metric(map, group, "errorHandling", &["edgeCaseHandling"]),
        documentation: metric(map, group, "documentation", &[]),
        testability: metric(map, group, "testability", &[]),
    }
}

fn nested<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn top_metric(map: &Map<String, Value>, key: &str) -> u8 {
    metric(map, None, key, &[])
}

/// Resolve a 1-10 metric: nested group first, then the same key at the top
/// level, then each alias in order.
fn metric(
    map: &Map<String, Value>,
    group: Option<&Map<String, Value>>,
    key: &str,
    aliases: &[&str],
) -> u8 {
    group
        .and_then(|g| g.get(key))
        .and_then(read_integer)
        .or_else(|| {
            std::iter::once(key)
                .chain(aliases.iter().copied())
                .find_map(|k| map.get(k).and_then(read_integer))
        })
        .map(clamp_metric)
        .unwrap_or(METRIC_DEFAULT)
}

/// Integers, floats (rounded) and numeric strings.
fn read_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| number.round() as i64)
}

fn read_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn read_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
