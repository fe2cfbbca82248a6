//! Per-answer evaluation results.

use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackRecord;
use crate::model::AnswerSubmission;

/// Where an answer's feedback came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackSource {
    /// The candidate skipped the question.
    Skipped,
    /// The answer gate rejected the response before scoring.
    Rejected { reason: String },
    /// AI feedback captured before this run, normalized.
    Recorded,
    /// Feedback from a live AI scorer, normalized.
    Ai { scorer: String },
    /// Heuristic fallback feedback.
    Heuristic,
}

impl FeedbackSource {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackSource::Skipped => "skipped",
            FeedbackSource::Rejected { .. } => "rejected",
            FeedbackSource::Recorded => "recorded",
            FeedbackSource::Ai { .. } => "ai",
            FeedbackSource::Heuristic => "heuristic",
        }
    }
}

/// A submitted answer together with the feedback produced for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedAnswer {
    pub submission: AnswerSubmission,
    #[serde(default)]
    pub feedback: Option<FeedbackRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FeedbackSource>,
}

impl EvaluatedAnswer {
    pub fn new(
        submission: AnswerSubmission,
        feedback: FeedbackRecord,
        source: FeedbackSource,
    ) -> Self {
        Self {
            submission,
            feedback: Some(feedback),
            source: Some(source),
        }
    }

    /// Answered and scored: not skipped, with feedback attached.
    pub fn answered_feedback(&self) -> Option<&FeedbackRecord> {
        if self.submission.skipped {
            None
        } else {
            self.feedback.as_ref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;

    #[test]
    fn skipped_answers_have_no_answered_feedback() {
        let mut submission = AnswerSubmission::new("q1", QuestionType::Technical, "");
        submission.skipped = true;
        let evaluated =
            EvaluatedAnswer::new(submission, FeedbackRecord::skipped(), FeedbackSource::Skipped);
        assert!(evaluated.answered_feedback().is_none());
    }

    #[test]
    fn source_wire_format() {
        let source = FeedbackSource::Ai {
            scorer: "openai".into(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["kind"], "ai");
        assert_eq!(json["scorer"], "openai");
        assert_eq!(source.label(), "ai");
    }
}
