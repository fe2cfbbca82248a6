//! The `grader evaluate` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use grader_core::engine::{EvaluationEngine, ProgressReporter};
use grader_core::parser;
use grader_core::report::SessionReport;
use grader_core::results::EvaluatedAnswer;
use grader_core::traits::FeedbackScorer;
use grader_providers::config::{load_config_from, GraderConfig};
use grader_providers::create_scorer;
use grader_report::html::write_html_report;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_answer_start(&self, question_id: &str) {
        eprintln!("  Evaluating: {question_id}");
    }

    fn on_answer_complete(&self, evaluated: &EvaluatedAnswer) {
        let score = evaluated
            .feedback
            .as_ref()
            .map(|f| f.score.to_string())
            .unwrap_or_else(|| "-".into());
        let source = evaluated.source.as_ref().map(|s| s.label()).unwrap_or("-");
        eprintln!(
            "  Done: {} score {} ({})",
            evaluated.submission.question_id, score, source
        );
    }

    fn on_scorer_error(&self, question_id: &str, error: &str) {
        eprintln!("  SCORER ERROR: {question_id}: {error} (falling back to heuristics)");
    }

    fn on_session_complete(&self, total: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {total} answers evaluated ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub struct EvaluateArgs {
    pub session_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub scorer: Option<String>,
    pub offline: bool,
    pub parallelism: Option<usize>,
    pub output: Option<PathBuf>,
    pub format: String,
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    if let Some(p) = args.parallelism {
        anyhow::ensure!(p >= 1, "parallelism must be at least 1");
    }

    let config = load_config_from(args.config_path.as_deref())?;
    let sessions = parser::load_sessions(&args.session_path)?;
    anyhow::ensure!(
        !sessions.is_empty(),
        "no sessions found in {}",
        args.session_path.display()
    );

    let scorer = if args.offline || !config.use_ai {
        None
    } else {
        select_scorer(&config, args.scorer.as_deref())?
    };

    let mut engine_config = config.engine_config();
    engine_config.use_ai = scorer.is_some();
    if let Some(p) = args.parallelism {
        engine_config.parallelism = p;
    }

    let engine = EvaluationEngine::new(scorer, engine_config);
    let reporter = ConsoleReporter;
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());

    let formats: Vec<&str> = match args.format.as_str() {
        "all" => vec!["json", "html"],
        "none" => vec![],
        other => other.split(',').map(str::trim).collect(),
    };

    for session in &sessions {
        eprintln!(
            "grader v{}: evaluating session '{}' ({} answers)",
            env!("CARGO_PKG_VERSION"),
            session.id,
            session.answers.len()
        );
        eprintln!();

        let report = engine.run(session, &reporter).await?;
        print_summary(&report);

        if formats.is_empty() {
            continue;
        }
        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let stem = format!("{}-{timestamp}", file_stem(&session.id));

        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("{stem}.json"));
                    report.save_json(&path)?;
                    eprintln!("Report saved to: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("{stem}.html"));
                    write_html_report(&report, &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                _ => {
                    eprintln!("Unknown format: {fmt}");
                }
            }
        }
    }

    Ok(())
}

/// Pick the scorer to use. An explicitly requested scorer must exist; a
/// missing default scorer means heuristic feedback only.
fn select_scorer(
    config: &GraderConfig,
    requested: Option<&str>,
) -> Result<Option<Arc<dyn FeedbackScorer>>> {
    let name = requested.unwrap_or(&config.default_scorer);
    match config.scorers.get(name) {
        Some(scorer_config) => Ok(Some(create_scorer(name, scorer_config)?)),
        None if requested.is_some() => anyhow::bail!(
            "scorer '{}' not found in config. Available: {:?}",
            name,
            config.scorers.keys().collect::<Vec<_>>()
        ),
        None => {
            tracing::warn!(scorer = name, "no scorer configured, using heuristic feedback");
            Ok(None)
        }
    }
}

/// Session ids become file names; keep them to a safe character set.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "session".to_string()
    } else {
        stem
    }
}

fn print_summary(report: &SessionReport) {
    use comfy_table::{Cell, Table};

    let mut questions = Table::new();
    questions.set_header(vec!["Question", "Type", "Source", "Score", "Relevance"]);
    for evaluated in &report.evaluations {
        let (score, relevance) = match &evaluated.feedback {
            Some(f) => (f.score.to_string(), f.response_type.to_string()),
            None => ("-".into(), "-".into()),
        };
        questions.add_row(vec![
            Cell::new(&evaluated.submission.question_id),
            Cell::new(evaluated.submission.question_type),
            Cell::new(evaluated.source.as_ref().map(|s| s.label()).unwrap_or("-")),
            Cell::new(score),
            Cell::new(relevance),
        ]);
    }
    println!("\n{questions}");

    let summary = &report.summary;
    let mut categories = Table::new();
    categories.set_header(vec!["Metric", "Value"]);
    categories.add_row(vec![Cell::new("Overall score"), Cell::new(summary.score)]);
    for (name, value) in summary.category_percentages.entries() {
        categories.add_row(vec![Cell::new(name), Cell::new(format!("{value}%"))]);
    }
    let b = &summary.breakdown;
    categories.add_row(vec![
        Cell::new("Answered"),
        Cell::new(format!("{}/{}", b.answered_questions, b.total_questions)),
    ]);
    categories.add_row(vec![Cell::new("Skipped"), Cell::new(b.skipped_questions)]);
    categories.add_row(vec![
        Cell::new("Avg response time"),
        Cell::new(format!("{}s", b.average_response_time)),
    ]);
    println!("{categories}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_safe() {
        assert_eq!(file_stem("mock-2024_01"), "mock-2024_01");
        assert_eq!(file_stem("a/b c"), "a_b_c");
        assert_eq!(file_stem(""), "session");
    }

    #[test]
    fn missing_default_scorer_means_heuristics() {
        let config = GraderConfig::default();
        assert!(select_scorer(&config, None).unwrap().is_none());
        assert!(select_scorer(&config, Some("anthropic")).is_err());
    }
}
