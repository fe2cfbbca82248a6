//! Heuristic analysis of submitted code.
//!
//! Looks for structural signals with simple regex presence tests, checks
//! bracket balance, folds in the (already resolved) execution result, and
//! turns all of that into a 0-100 score with strengths and improvements.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ExecutionResult;

/// Code shorter than this (trimmed) is not analyzed.
pub const MIN_ANALYZABLE_CHARS: usize = 10;
/// Score for missing or trivially short code.
pub const DEGENERATE_CODE_SCORE: u8 = 5;

const BASE_SCORE: u32 = 20;
const STRUCTURE_POINTS: u32 = 15;
const CONTROL_FLOW_POINTS: u32 = 15;
const RETURN_POINTS: u32 = 10;
const VARIABLE_POINTS: u32 = 10;
const LOGIC_POINTS: u32 = 10;
const CLEAN_SYNTAX_POINTS: u32 = 15;
const EXECUTION_POINTS: u32 = 20;
const EXPLANATION_POINTS: u32 = 5;
const EXPLANATION_MIN_CHARS: usize = 50;
const LOGIC_MIN_CHARS: usize = 50;

static STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(function|def|class|public|void)\b").expect("valid regex")
});
static CONTROL_FLOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(if|else|for|while|switch)\b").expect("valid regex"));
static RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breturn\b").expect("valid regex"));
static VARIABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(let|const|var|int|long|float|double|char|bool|auto|String)\s+\w+|\w+\s*=[^=]")
        .expect("valid regex")
});

/// Which structural signals fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSignals {
    pub has_structure: bool,
    pub has_control_flow: bool,
    pub has_return: bool,
    pub has_variables: bool,
    pub has_logic: bool,
}

impl CodeSignals {
    pub fn detect(code: &str) -> Self {
        Self {
            has_structure: STRUCTURE.is_match(code),
            has_control_flow: CONTROL_FLOW.is_match(code),
            has_return: RETURN.is_match(code),
            has_variables: VARIABLES.is_match(code),
            has_logic: code.chars().count() > LOGIC_MIN_CHARS
                && code.contains(['{', '}', '(', ')', ';']),
        }
    }
}

/// A bracket kind whose open and close counts differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxIssue {
    MismatchedBraces { open: usize, close: usize },
    MismatchedParentheses { open: usize, close: usize },
}

impl SyntaxIssue {
    pub fn describe(&self) -> String {
        match self {
            SyntaxIssue::MismatchedBraces { open, close } => {
                format!("mismatched braces ({open} opening, {close} closing)")
            }
            SyntaxIssue::MismatchedParentheses { open, close } => {
                format!("mismatched parentheses ({open} opening, {close} closing)")
            }
        }
    }
}

/// Count `{}` and `()` and report each kind that does not balance.
pub fn check_brackets(code: &str) -> Vec<SyntaxIssue> {
    let count = |c: char| code.chars().filter(|&x| x == c).count();
    let mut issues = Vec::new();

    let (open, close) = (count('{'), count('}'));
    if open != close {
        issues.push(SyntaxIssue::MismatchedBraces { open, close });
    }
    let (open, close) = (count('('), count(')'));
    if open != close {
        issues.push(SyntaxIssue::MismatchedParentheses { open, close });
    }

    issues
}

/// What the execution result says about the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// No execution result was supplied.
    NotRun,
    /// Execution reported an error.
    Failed { error: String },
    /// Execution produced output and no error.
    Succeeded,
    /// Execution produced neither output nor an error.
    NoOutput,
}

impl ExecutionOutcome {
    pub fn from_result(result: Option<&ExecutionResult>) -> Self {
        let Some(result) = result else {
            return ExecutionOutcome::NotRun;
        };
        if let Some(error) = result.error_text() {
            return ExecutionOutcome::Failed {
                error: error.to_string(),
            };
        }
        if result.output_text().is_some() {
            ExecutionOutcome::Succeeded
        } else {
            ExecutionOutcome::NoOutput
        }
    }

    fn points(&self) -> u32 {
        match self {
            ExecutionOutcome::Succeeded => EXECUTION_POINTS,
            _ => 0,
        }
    }
}

/// Quality profile of one code submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub signals: CodeSignals,
    pub syntax_issues: Vec<SyntaxIssue>,
    pub execution: ExecutionOutcome,
    pub score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Analyze submitted code.
///
/// `response_text` is the prose accompanying the code; a substantial
/// explanation earns a small bonus.
pub fn analyze_code(
    code: Option<&str>,
    response_text: &str,
    execution: Option<&ExecutionResult>,
) -> CodeAnalysis {
    let code = code.unwrap_or_default();
    if code.trim().chars().count() < MIN_ANALYZABLE_CHARS {
        return degenerate(execution);
    }

    let signals = CodeSignals::detect(code);
    let syntax_issues = check_brackets(code);
    let execution = ExecutionOutcome::from_result(execution);
    let explained = response_text.chars().count() > EXPLANATION_MIN_CHARS;

    let mut score = BASE_SCORE;
    if signals.has_structure {
        score += STRUCTURE_POINTS;
    }
    if signals.has_control_flow {
        score += CONTROL_FLOW_POINTS;
    }
    if signals.has_return {
        score += RETURN_POINTS;
    }
    if signals.has_variables {
        score += VARIABLE_POINTS;
    }
    if signals.has_logic {
        score += LOGIC_POINTS;
    }
    if syntax_issues.is_empty() {
        score += CLEAN_SYNTAX_POINTS;
    }
    score += execution.points();
    if explained {
        score += EXPLANATION_POINTS;
    }
    let score = score.min(100) as u8;

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    if signals.has_structure {
        strengths.push("Organizes the solution into functions or classes".to_string());
        if syntax_issues.is_empty() {
            strengths.push("Correct basic syntax".to_string());
        }
    } else {
        improvements.push("Structure the solution as a function or class".to_string());
    }

    if signals.has_control_flow {
        strengths.push("Uses control flow to implement the logic".to_string());
    } else {
        improvements.push("Add logical control flow (conditionals or loops)".to_string());
    }

    if signals.has_return {
        strengths.push("Returns a result from the solution".to_string());
    } else {
        improvements.push("Return the computed result explicitly".to_string());
    }

    if signals.has_variables {
        strengths.push("Uses variables to track intermediate state".to_string());
    }

    for issue in &syntax_issues {
        improvements.push(format!("Fix syntax error: {}", issue.describe()));
    }

    match &execution {
        ExecutionOutcome::Succeeded => {
            strengths.push("Code executed successfully and produced output".to_string());
        }
        ExecutionOutcome::Failed { error } => {
            improvements.push(format!(
                "Resolve the execution error: {}",
                excerpt(error, 120)
            ));
        }
        ExecutionOutcome::NoOutput => {
            improvements.push("Make sure the code produces the expected output".to_string());
        }
        ExecutionOutcome::NotRun => {}
    }

    if explained {
        strengths.push("Explains the approach alongside the code".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Attempted a code solution".to_string());
    }
    improvements.push("Add comments to explain complex logic".to_string());
    improvements.push("Test the solution with different inputs and edge cases".to_string());

    tracing::debug!(score, ?signals, issues = syntax_issues.len(), "code analyzed");

    CodeAnalysis {
        signals,
        syntax_issues,
        execution,
        score,
        strengths,
        improvements,
    }
}

fn degenerate(execution: Option<&ExecutionResult>) -> CodeAnalysis {
    CodeAnalysis {
        signals: CodeSignals::default(),
        syntax_issues: Vec::new(),
        execution: ExecutionOutcome::from_result(execution),
        score: DEGENERATE_CODE_SCORE,
        strengths: vec!["Submitted a response".to_string()],
        improvements: vec![
            "Provide an actual code implementation".to_string(),
            "Write a complete solution that addresses the problem".to_string(),
            "Include the core logic rather than a placeholder".to_string(),
        ],
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{cut}...")
}
