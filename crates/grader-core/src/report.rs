//! Session report types with JSON persistence and progress comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::SessionSummary;
use crate::model::InterviewSession;
use crate::results::EvaluatedAnswer;

/// A complete evaluation report for one interview session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the session (without the answers).
    pub session: SessionInfo,
    /// Per-answer feedback, in submission order.
    pub evaluations: Vec<EvaluatedAnswer>,
    /// Aggregate over all answers.
    pub summary: SessionSummary,
    /// Total wall-clock evaluation time in milliseconds.
    pub duration_ms: u64,
}

/// Identifying data of the evaluated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
    pub question_count: usize,
}

impl SessionInfo {
    pub fn from_session(session: &InterviewSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            candidate_id: session.candidate_id.clone(),
            question_count: session.answers.len(),
        }
    }
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against an earlier one.
    ///
    /// `threshold` is in score points: deltas within it count as unchanged.
    /// Session metrics (overall score and each category percentage) are
    /// compared first, then per-question scores matched by question id.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ProgressReport {
        let mut progress = ProgressReport::default();

        let current_metrics = summary_metrics(&self.summary);
        for (name, baseline_value) in summary_metrics(&baseline.summary) {
            let current_value = current_metrics
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .unwrap_or(0.0);
            progress.record(name.to_string(), baseline_value, current_value, threshold);
        }

        let question_scores = |report: &SessionReport| -> HashMap<String, f64> {
            report
                .evaluations
                .iter()
                .filter_map(|e| {
                    e.answered_feedback()
                        .map(|f| (e.submission.question_id.clone(), f64::from(f.score)))
                })
                .collect()
        };
        let baseline_questions = question_scores(baseline);
        let current_questions = question_scores(self);

        let mut ids: Vec<&String> = current_questions.keys().collect();
        ids.sort();
        for id in ids {
            let current = current_questions[id];
            match baseline_questions.get(id) {
                Some(&before) => {
                    progress.record(format!("question:{id}"), before, current, threshold)
                }
                None => progress.new_questions += 1,
            }
        }
        progress.removed_questions = baseline_questions
            .keys()
            .filter(|id| !current_questions.contains_key(*id))
            .count();

        progress
    }
}

fn summary_metrics(summary: &SessionSummary) -> Vec<(&'static str, f64)> {
    let mut metrics = vec![("score", f64::from(summary.score))];
    metrics.extend(
        summary
            .category_percentages
            .entries()
            .into_iter()
            .map(|(name, value)| (name, f64::from(value))),
    );
    metrics
}

/// Result of comparing two session reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Metrics that went down by more than the threshold.
    pub regressions: Vec<MetricChange>,
    /// Metrics that went up by more than the threshold.
    pub improvements: Vec<MetricChange>,
    /// Metrics with no significant change.
    pub unchanged: usize,
    /// Answered questions in current but not baseline.
    pub new_questions: usize,
    /// Answered questions in baseline but not current.
    pub removed_questions: usize,
}

/// A single metric compared across two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricChange {
    /// `score`, a category name, or `question:<id>`.
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    pub delta: f64,
}

impl ProgressReport {
    fn record(&mut self, metric: String, baseline: f64, current: f64, threshold: f64) {
        let delta = current - baseline;
        let change = MetricChange {
            metric,
            baseline,
            current,
            delta,
        };
        if delta < -threshold {
            self.regressions.push(change);
        } else if delta > threshold {
            self.improvements.push(change);
        } else {
            self.unchanged += 1;
        }
    }

    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        let table = |md: &mut String, title: &str, changes: &[MetricChange]| {
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Metric | Baseline | Current | Delta |\n");
            md.push_str("|--------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.0} | {:.0} | {:+.0} |\n",
                    c.metric, c.baseline, c.current, c.delta
                ));
            }
            md.push('\n');
        };

        if !self.regressions.is_empty() {
            table(&mut md, "Regressions", &self.regressions);
        }
        if !self.improvements.is_empty() {
            table(&mut md, "Improvements", &self.improvements);
        }
        if self.new_questions > 0 || self.removed_questions > 0 {
            md.push_str(&format!(
                "{} new questions, {} removed questions\n",
                self.new_questions, self.removed_questions
            ));
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
