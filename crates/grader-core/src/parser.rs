//! Interview session loader.
//!
//! Loads sessions from TOML or JSON files and directories, and validates
//! them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerSubmission, InterviewSession};

/// Intermediate TOML structure for session files.
#[derive(Debug, Deserialize)]
struct TomlSessionFile {
    session: TomlSessionHeader,
    #[serde(default)]
    answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Deserialize)]
struct TomlSessionHeader {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    candidate_id: Option<String>,
    #[serde(default)]
    total_duration_secs: u64,
}

/// Parse a session file, choosing the format from its extension.
pub fn parse_session(path: &Path) -> Result<InterviewSession> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_session_json_str(&content, path),
        _ => parse_session_str(&content, path),
    }
}

/// Parse a TOML string into an `InterviewSession` (useful for testing).
pub fn parse_session_str(content: &str, source_path: &Path) -> Result<InterviewSession> {
    let parsed: TomlSessionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(InterviewSession {
        id: parsed.session.id,
        title: parsed.session.title,
        candidate_id: parsed.session.candidate_id,
        total_duration_secs: parsed.session.total_duration_secs,
        answers: parsed.answers,
    })
}

/// Parse a JSON session document.
pub fn parse_session_json_str(content: &str, source_path: &Path) -> Result<InterviewSession> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
}

/// Recursively load all `.toml` and `.json` sessions from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_session_directory(dir: &Path) -> Result<Vec<InterviewSession>> {
    let mut sessions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sessions.extend(load_session_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_session(&path) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sessions)
}

/// Load one session file, or every session in a directory.
pub fn load_sessions(path: &Path) -> Result<Vec<InterviewSession>> {
    if path.is_dir() {
        load_session_directory(path)
    } else {
        Ok(vec![parse_session(path)?])
    }
}

/// A warning from session validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn for_question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a session for common data problems.
pub fn validate_session(session: &InterviewSession) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if session.answers.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "session has no answers".into(),
        });
    } else if session.total_duration_secs == 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "total_duration_secs is zero".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for answer in &session.answers {
        if !seen_ids.insert(&answer.question_id) {
            warnings.push(ValidationWarning::for_question(
                &answer.question_id,
                format!("duplicate question ID: {}", answer.question_id),
            ));
        }
    }

    for answer in &session.answers {
        let code = answer.code.as_deref().unwrap_or("").trim();

        if answer.skipped {
            if !answer.response_text.trim().is_empty() || !code.is_empty() {
                warnings.push(ValidationWarning::for_question(
                    &answer.question_id,
                    "answer is marked skipped but carries a response; it will not be scored",
                ));
            }
            continue;
        }

        if answer.question_type.is_coding() {
            if code.is_empty() {
                warnings.push(ValidationWarning::for_question(
                    &answer.question_id,
                    "coding answer has no code",
                ));
            } else if answer
                .starter_code_for_language()
                .is_some_and(|starter| starter.trim() == code)
            {
                warnings.push(ValidationWarning::for_question(
                    &answer.question_id,
                    "submitted code is identical to the starter code",
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[session]
id = "mock-2024-01"
title = "Backend mock interview"
candidate_id = "cand-42"
total_duration_secs = 1800

[[answers]]
question_id = "b1"
question_type = "behaviour"
question = "Tell me about a time you resolved a conflict."
response_text = "At my previous job two teams disagreed on an API contract."
response_time = 120

[[answers]]
question_id = "c1"
question_type = "coding"
language = "python"
code = """
def two_sum(nums, target):
    seen = {}
    for i, n in enumerate(nums):
        if target - n in seen:
            return [seen[target - n], i]
        seen[n] = i
"""
response_time = 600

[answers.execution_result]
output = "[0, 1]"

[answers.starter_code]
python = "def two_sum(nums, target):\n    pass"
"#;

    #[test]
    fn parse_valid_toml() {
        let session = parse_session_str(VALID_TOML, &PathBuf::from("s.toml")).unwrap();
        assert_eq!(session.id, "mock-2024-01");
        assert_eq!(session.candidate_id.as_deref(), Some("cand-42"));
        assert_eq!(session.answers.len(), 2);
        assert_eq!(session.answers[0].question_type, QuestionType::Behavioral);
        let coding = &session.answers[1];
        assert_eq!(coding.question_type, QuestionType::Coding);
        assert_eq!(
            coding.execution_result.as_ref().unwrap().output.as_deref(),
            Some("[0, 1]")
        );
        assert!(coding.starter_code_for_language().is_some());
        assert!(validate_session(&session).is_empty());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[session]
id = "minimal"

[[answers]]
question_id = "q1"
question_type = "something-new"
"#;
        let session = parse_session_str(toml, &PathBuf::from("s.toml")).unwrap();
        assert_eq!(session.total_duration_secs, 0);
        assert_eq!(session.answers[0].question_type, QuestionType::Technical);
        assert!(session.answers[0].response_text.is_empty());
        assert!(!session.answers[0].skipped);
    }

    #[test]
    fn parse_json_session() {
        let json = r#"{
            "id": "j1",
            "total_duration_secs": 60,
            "answers": [
                {"question_id": "q1", "question_type": "technical", "response_text": "An answer", "skipped": true}
            ]
        }"#;
        let session = parse_session_json_str(json, &PathBuf::from("s.json")).unwrap();
        assert_eq!(session.id, "j1");
        assert!(session.answers[0].skipped);
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_session_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_data_problems() {
        let toml = r#"
[session]
id = "problems"

[[answers]]
question_id = "q1"
question_type = "coding"
language = "javascript"
code = "function f() {}"

[answers.starter_code]
javascript = "function f() {}"

[[answers]]
question_id = "q1"
question_type = "coding"

[[answers]]
question_id = "q3"
question_type = "technical"
skipped = true
response_text = "half an answer"
"#;
        let session = parse_session_str(toml, &PathBuf::from("s.toml")).unwrap();
        let warnings = validate_session(&session);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("total_duration_secs is zero")));
        assert!(messages.iter().any(|m| m.contains("duplicate question ID: q1")));
        assert!(messages.iter().any(|m| m.contains("identical to the starter code")));
        assert!(messages.iter().any(|m| m.contains("has no code")));
        assert!(messages.iter().any(|m| m.contains("marked skipped")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[[[").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("b.json"),
            r#"{"id": "nested", "answers": []}"#,
        )
        .unwrap();

        let sessions = load_sessions(dir.path()).unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["mock-2024-01", "nested"]);
    }

    #[test]
    fn load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        assert_eq!(load_sessions(&path).unwrap().len(), 1);
    }
}
