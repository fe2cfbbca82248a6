//! Heuristic fallback feedback.
//!
//! Used when the AI scorer is disabled or fails. Runs the code or text
//! analyzer for the question, derives the rubric sub-scores from the
//! overall score, and hands the result to the normalizer so heuristic and
//! AI feedback come out in the same canonical shape.

use serde_json::json;

use crate::code_analysis::analyze_code;
use crate::feedback::FeedbackRecord;
use crate::model::ExecutionResult;
use crate::normalize::{process_feedback, RawFeedback};
use crate::text_analysis::{analyze_behavioral, analyze_technical};

/// Which analyzer a raw question type string is routed to.
///
/// Only the exact names `coding` and `technical` (case-insensitive) select
/// their analyzers; everything else, including unknown types, gets the
/// behavioral analyzer. This is deliberately not
/// [`QuestionType::normalize`](crate::model::QuestionType::normalize),
/// which sends unknown types to technical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackBranch {
    Coding,
    Technical,
    Behavioral,
}

impl FallbackBranch {
    pub fn from_raw(question_type: &str) -> Self {
        match question_type.trim().to_lowercase().as_str() {
            "coding" => FallbackBranch::Coding,
            "technical" => FallbackBranch::Technical,
            _ => FallbackBranch::Behavioral,
        }
    }
}

/// Divisors turning a 0-100 score into 1-10 rubric metrics.
mod divisor {
    pub const QUESTION_RELEVANCE: u32 = 15;
    pub const CORRECTNESS: u32 = 15;
    pub const SYNTAX_CODING: u32 = 12;
    pub const SYNTAX_OTHER: u32 = 15;
    pub const LANGUAGE_BEST_PRACTICES: u32 = 15;
    pub const EFFICIENCY: u32 = 20;
    pub const STRUCTURE_AND_READABILITY: u32 = 15;
    pub const EDGE_CASE_HANDLING: u32 = 25;
    pub const COMMUNICATION_CLARITY: u32 = 15;
    pub const TECHNICAL_ACCURACY: u32 = 15;
}

/// `max(1, floor(score / divisor))`
fn derive_metric(score: u8, divisor: u32) -> u32 {
    (score as u32 / divisor).max(1)
}

/// Build a complete feedback record without any AI involvement.
pub fn generate_fallback_feedback(
    question_type: &str,
    response_text: &str,
    code: Option<&str>,
    language: Option<&str>,
    execution_result: Option<&ExecutionResult>,
) -> FeedbackRecord {
    let branch = FallbackBranch::from_raw(question_type);

    let (score, strengths, improvements) = match branch {
        FallbackBranch::Coding => {
            let analysis = analyze_code(code, response_text, execution_result);
            (analysis.score, analysis.strengths, analysis.improvements)
        }
        FallbackBranch::Technical => {
            let analysis = analyze_technical(response_text);
            (analysis.score, analysis.strengths, analysis.improvements)
        }
        FallbackBranch::Behavioral => {
            let analysis = analyze_behavioral(response_text);
            (analysis.score, analysis.strengths, analysis.improvements)
        }
    };

    let subject = match branch {
        FallbackBranch::Coding => match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(lang) => format!("{lang} solution"),
            None => "code solution".to_string(),
        },
        FallbackBranch::Technical => "technical answer".to_string(),
        FallbackBranch::Behavioral => "behavioral answer".to_string(),
    };
    let (detailed_analysis, overall_assessment) = describe_band(score, &subject);

    let syntax_divisor = if branch == FallbackBranch::Coding {
        divisor::SYNTAX_CODING
    } else {
        divisor::SYNTAX_OTHER
    };

    tracing::debug!(?branch, score, "fallback feedback generated");

    let payload = json!({
        "score": score,
        "strengths": strengths,
        "improvements": improvements,
        "detailedAnalysis": detailed_analysis,
        "overallAssessment": overall_assessment,
        "questionRelevance": derive_metric(score, divisor::QUESTION_RELEVANCE),
        "correctness": derive_metric(score, divisor::CORRECTNESS),
        "syntax": derive_metric(score, syntax_divisor),
        "languageBestPractices": derive_metric(score, divisor::LANGUAGE_BEST_PRACTICES),
        "efficiency": derive_metric(score, divisor::EFFICIENCY),
        "structureAndReadability": derive_metric(score, divisor::STRUCTURE_AND_READABILITY),
        "edgeCaseHandling": derive_metric(score, divisor::EDGE_CASE_HANDLING),
        "communicationClarity": derive_metric(score, divisor::COMMUNICATION_CLARITY),
        "technicalAccuracy": derive_metric(score, divisor::TECHNICAL_ACCURACY),
    });

    process_feedback(
        &RawFeedback::Structured(payload),
        branch == FallbackBranch::Coding,
    )
}

fn describe_band(score: u8, subject: &str) -> (String, String) {
    let (analysis, overall) = match score {
        0..=24 => (
            format!(
                "The {subject} does not adequately address the question and lacks the \
                 substance needed for a meaningful evaluation."
            ),
            "Needs significant improvement",
        ),
        25..=49 => (
            format!(
                "The {subject} partially addresses the question but is missing key elements \
                 of a complete response."
            ),
            "Below expectations",
        ),
        50..=69 => (
            format!(
                "The {subject} addresses the question reasonably well, with room for more \
                 depth and precision."
            ),
            "Meets expectations",
        ),
        _ => (
            format!("The {subject} is strong and addresses the question well."),
            "Strong response",
        ),
    };
    (
        format!("{analysis} This feedback was produced by heuristic evaluation."),
        overall.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::ResponseType;
    use crate::model::QuestionType;

    #[test]
    fn empty_code_is_off_topic() {
        for code in [None, Some(""), Some("   "), Some("\n\t\n")] {
            let record = generate_fallback_feedback("coding", "", code, Some("python"), None);
            assert_eq!(record.score, 5);
            assert_eq!(record.response_type, ResponseType::CompletelyOffTopic);
            assert!(record.code_metrics.is_some());
        }
    }

    #[test]
    fn metrics_follow_divisors() {
        let code = r#"
function fizzBuzz(n) {
    const out = [];
    for (let i = 1; i <= n; i++) {
        if (i % 15 === 0) out.push("FizzBuzz");
        else out.push(String(i));
    }
    return out;
}
"#;
        let run = ExecutionResult {
            output: Some("1\n2\nFizz".into()),
            ..Default::default()
        };
        let record = generate_fallback_feedback("coding", "", Some(code), Some("javascript"), Some(&run));
        assert_eq!(record.score, 100);
        assert_eq!(record.question_relevance, 6);
        assert_eq!(record.communication_clarity, 6);
        let metrics = record.code_metrics.unwrap();
        assert_eq!(metrics.syntax_correctness, 8); // 100 / 12
        assert_eq!(metrics.efficiency, 5); // 100 / 20
        assert_eq!(metrics.logical_flow, 6);
        let thinking = record.algorithmic_thinking.unwrap();
        assert_eq!(thinking.edge_case_handling, 4); // 100 / 25
        assert_eq!(record.overall_assessment, "Strong response");
        assert!(record.detailed_analysis.contains("javascript solution"));
    }

    #[test]
    fn low_scores_floor_at_one() {
        let record = generate_fallback_feedback("technical", "Too short.", None, None, None);
        assert_eq!(record.score, 10);
        assert_eq!(record.question_relevance, 1);
        assert_eq!(record.technical_accuracy, 1);
        assert_eq!(record.overall_assessment, "Needs significant improvement");
        assert!(record.code_metrics.is_none());
    }

    #[test]
    fn bands() {
        assert_eq!(describe_band(24, "x").1, "Needs significant improvement");
        assert_eq!(describe_band(25, "x").1, "Below expectations");
        assert_eq!(describe_band(49, "x").1, "Below expectations");
        assert_eq!(describe_band(50, "x").1, "Meets expectations");
        assert_eq!(describe_band(70, "x").1, "Strong response");
    }

    #[test]
    fn unknown_type_uses_behavioral_branch() {
        // The fallback dispatch and QuestionType::normalize disagree on the
        // default for unknown types. Both behaviors are pinned here.
        assert_eq!(FallbackBranch::from_raw("quantum"), FallbackBranch::Behavioral);
        assert_eq!(QuestionType::normalize("quantum"), QuestionType::Technical);

        let short = "Databases store data for applications to use later on.";
        let via_unknown = generate_fallback_feedback("quantum", short, None, None, None);
        let via_technical = generate_fallback_feedback("technical", short, None, None, None);
        // Under 100 chars: behavioral degenerate score.
        assert_eq!(via_unknown.score, 15);
        // Over 50 chars with terminology: technical scoring.
        assert_eq!(via_technical.score, 35);
    }

    #[test]
    fn synonyms_are_not_recognized_by_dispatch() {
        assert_eq!(FallbackBranch::from_raw("behaviour"), FallbackBranch::Behavioral);
        assert_eq!(FallbackBranch::from_raw("problem-solving"), FallbackBranch::Behavioral);
        assert_eq!(FallbackBranch::from_raw(" Coding "), FallbackBranch::Coding);
        assert_eq!(FallbackBranch::from_raw("TECHNICAL"), FallbackBranch::Technical);
    }

    #[test]
    fn behavioral_feedback_is_complete() {
        let text = "At my last company our release process was slow. I proposed a trunk-based \
                    workflow and I set up feature flags. As a result, lead time dropped by half.";
        let record = generate_fallback_feedback("behavioral", text, None, None, None);
        assert_eq!(record.score, 60);
        assert_eq!(record.question_relevance, 4);
        assert!(!record.strengths.is_empty());
        assert!(!record.detailed_analysis.is_empty());
        assert!(record.code_quality.is_none());
    }
}
