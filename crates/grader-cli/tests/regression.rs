//! Progress comparison integration tests.
//!
//! Tests the report comparison workflow end-to-end, including
//! JSON serialization, report loading, and regression detection.

use grader_core::aggregate::calculate_final_results;
use grader_core::feedback::FeedbackRecord;
use grader_core::model::{AnswerSubmission, QuestionType};
use grader_core::normalize::{process_feedback, RawFeedback};
use grader_core::report::{SessionInfo, SessionReport};
use grader_core::results::{EvaluatedAnswer, FeedbackSource};
use uuid::Uuid;

fn make_answer(id: &str, question_type: QuestionType, score: Option<u8>) -> EvaluatedAnswer {
    let mut submission = AnswerSubmission::new(id, question_type, "an answer");
    match score {
        Some(score) => {
            let feedback = process_feedback(
                &RawFeedback::from(serde_json::json!({
                    "score": score,
                    "communicationClarity": 7,
                    "technicalAccuracy": 6,
                })),
                question_type.is_coding(),
            );
            EvaluatedAnswer::new(submission, feedback, FeedbackSource::Recorded)
        }
        None => {
            submission.skipped = true;
            submission.response_text.clear();
            EvaluatedAnswer::new(submission, FeedbackRecord::skipped(), FeedbackSource::Skipped)
        }
    }
}

fn make_report(evaluations: Vec<EvaluatedAnswer>) -> SessionReport {
    SessionReport {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        session: SessionInfo {
            id: "weekly-mock".into(),
            title: "Weekly mock interview".into(),
            candidate_id: Some("cand-7".into()),
            question_count: evaluations.len(),
        },
        summary: calculate_final_results(&evaluations, 1800),
        evaluations,
        duration_ms: 1000,
    }
}

#[test]
fn detect_regression_when_a_question_drops() {
    let baseline = make_report(vec![
        make_answer("b1", QuestionType::Behavioral, Some(80)),
        make_answer("t1", QuestionType::Technical, Some(70)),
    ]);
    let current = make_report(vec![
        make_answer("b1", QuestionType::Behavioral, Some(50)),
        make_answer("t1", QuestionType::Technical, Some(70)),
    ]);

    let report = current.compare(&baseline, 5.0);

    assert!(report.has_regressions());
    let metrics: Vec<&str> = report.regressions.iter().map(|c| c.metric.as_str()).collect();
    assert!(metrics.contains(&"score"));
    assert!(metrics.contains(&"behavioral"));
    assert!(metrics.contains(&"question:b1"));
    let b1 = report
        .regressions
        .iter()
        .find(|c| c.metric == "question:b1")
        .unwrap();
    assert_eq!(b1.delta, -30.0);
}

#[test]
fn detect_improvement() {
    let baseline = make_report(vec![make_answer("c1", QuestionType::Coding, Some(40))]);
    let current = make_report(vec![make_answer("c1", QuestionType::Coding, Some(90))]);

    let report = current.compare(&baseline, 5.0);

    assert!(!report.has_regressions());
    assert!(report
        .improvements
        .iter()
        .any(|c| c.metric == "question:c1" && c.delta == 50.0));
    // problemSolving follows coding when there are no technical answers.
    assert!(report.improvements.iter().any(|c| c.metric == "problemSolving"));
}

#[test]
fn no_change_with_identical_results() {
    let baseline = make_report(vec![
        make_answer("b1", QuestionType::Behavioral, Some(75)),
        make_answer("t1", QuestionType::Technical, Some(65)),
    ]);

    let report = baseline.compare(&baseline, 5.0);

    assert!(!report.has_regressions());
    assert!(report.improvements.is_empty());
    // score + six categories + two questions
    assert_eq!(report.unchanged, 9);
}

#[test]
fn skipped_questions_are_not_compared() {
    let baseline = make_report(vec![
        make_answer("t1", QuestionType::Technical, Some(60)),
        make_answer("t2", QuestionType::Technical, None),
    ]);
    let current = make_report(vec![
        make_answer("t1", QuestionType::Technical, Some(60)),
        make_answer("t2", QuestionType::Technical, Some(80)),
        make_answer("t3", QuestionType::Technical, Some(60)),
    ]);

    let report = current.compare(&baseline, 5.0);

    assert_eq!(report.new_questions, 2);
    assert_eq!(report.removed_questions, 0);
}

#[test]
fn detect_removed_questions() {
    let baseline = make_report(vec![
        make_answer("old", QuestionType::Technical, Some(60)),
        make_answer("shared", QuestionType::Technical, Some(60)),
    ]);
    let current = make_report(vec![make_answer("shared", QuestionType::Technical, Some(60))]);

    let report = current.compare(&baseline, 5.0);

    assert_eq!(report.removed_questions, 1);
    assert_eq!(report.new_questions, 0);
}

#[test]
fn json_roundtrip_preserves_data() {
    let report = make_report(vec![
        make_answer("b1", QuestionType::Behavioral, Some(80)),
        make_answer("c1", QuestionType::Coding, None),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    report.save_json(&path).unwrap();
    let loaded = SessionReport::load_json(&path).unwrap();

    assert_eq!(loaded.evaluations.len(), 2);
    assert_eq!(loaded.session.id, "weekly-mock");
    assert_eq!(loaded.summary, report.summary);
    assert_eq!(loaded.evaluations[1].source, Some(FeedbackSource::Skipped));
    assert!(loaded.evaluations[1].answered_feedback().is_none());
}

#[test]
fn markdown_report_format() {
    let baseline = make_report(vec![make_answer("t1", QuestionType::Technical, Some(90))]);
    let current = make_report(vec![make_answer("t1", QuestionType::Technical, Some(40))]);

    let md = current.compare(&baseline, 5.0).to_markdown();

    assert!(md.contains("### Regressions"));
    assert!(md.contains("| question:t1 | 90 | 40 | -50 |"));
}

#[test]
fn threshold_controls_sensitivity() {
    let baseline = make_report(vec![make_answer("t1", QuestionType::Technical, Some(72))]);
    let current = make_report(vec![make_answer("t1", QuestionType::Technical, Some(68))]);

    let strict = current.compare(&baseline, 1.0);
    assert!(strict.has_regressions());

    let relaxed = current.compare(&baseline, 5.0);
    assert!(!relaxed.has_regressions());
}
