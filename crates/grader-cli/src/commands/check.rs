//! The `grader check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use grader_core::fallback::generate_fallback_feedback;
use grader_core::gate::{assess_answer, GateVerdict};
use grader_core::model::QuestionType;

pub fn execute(
    question_type: String,
    text: String,
    code_file: Option<PathBuf>,
    feedback: bool,
) -> Result<()> {
    let code = match &code_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read code from {}", path.display()))?,
        ),
        None => None,
    };

    let normalized = QuestionType::normalize(&question_type);
    match assess_answer(&text, normalized, code.as_deref()) {
        GateVerdict::Accepted => println!("VALID"),
        GateVerdict::Rejected(reason) => println!("INVALID: {reason}"),
    }

    if feedback {
        // The heuristic generator dispatches on the raw type string.
        let record = generate_fallback_feedback(&question_type, &text, code.as_deref(), None, None);
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    Ok(())
}
