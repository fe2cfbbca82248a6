//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use grader_core::aggregate::CategoryPercentages;
use grader_core::report::SessionReport;
use grader_core::results::EvaluatedAnswer;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// CSS class for a 0-100 score.
fn score_class(score: u8) -> &'static str {
    match score {
        70..=100 => "pass",
        45..=69 => "warn",
        _ => "fail",
    }
}

/// Generate an HTML report from a session report.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();
    let title = if report.session.title.is_empty() {
        &report.session.id
    } else {
        &report.session.title
    };

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Interview feedback: {}</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    let candidate = report
        .session
        .candidate_id
        .as_deref()
        .map(|c| format!(" | Candidate: <strong>{}</strong>", html_escape(c)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">Session: <strong>{}</strong>{} | {} questions | {}</p>\n",
        html_escape(&report.session.id),
        candidate,
        report.session.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let summary = &report.summary;
    let b = &summary.breakdown;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p class=\"overall {}\">Overall score: <strong>{}</strong>/100</p>\n",
        score_class(summary.score),
        summary.score
    ));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Questions</th><th>Answered</th><th>Skipped</th><th>Behavioral</th><th>Technical</th><th>Coding</th><th>Avg response</th><th>Duration</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}s</td><td>{}</td></tr></tbody>\n",
        b.total_questions,
        b.answered_questions,
        b.skipped_questions,
        b.behavioral_questions,
        b.technical_questions,
        b.coding_questions,
        b.average_response_time,
        format_duration(summary.total_duration),
    ));
    html.push_str("</table>\n");
    html.push_str(&generate_bar_chart(&summary.category_percentages));
    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Type</th><th onclick=\"sortTable(2)\">Source</th><th onclick=\"sortTable(3)\">Score</th><th onclick=\"sortTable(4)\">Relevance</th><th>Strengths</th><th>Improvements</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for evaluated in &report.evaluations {
        html.push_str(&question_row(evaluated));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Detailed analysis
    html.push_str("<section class=\"details\">\n");
    html.push_str("<h2>Detailed feedback</h2>\n");
    for evaluated in &report.evaluations {
        let Some(feedback) = evaluated.feedback.as_ref() else {
            continue;
        };
        let question = evaluated
            .submission
            .question
            .as_deref()
            .unwrap_or(&evaluated.submission.question_id);
        html.push_str("<details>\n");
        html.push_str(&format!(
            "<summary>{}: {}</summary>\n",
            html_escape(&evaluated.submission.question_id),
            html_escape(question)
        ));
        if !feedback.overall_assessment.is_empty() {
            html.push_str(&format!(
                "<p><em>{}</em></p>\n",
                html_escape(&feedback.overall_assessment)
            ));
        }
        html.push_str(&format!("<p>{}</p>\n", html_escape(&feedback.detailed_analysis)));
        html.push_str(&format!(
            "<p class=\"meta\">Communication {}/10 | Technical accuracy {}/10 | Relevance {}/10</p>\n",
            feedback.communication_clarity, feedback.technical_accuracy, feedback.question_relevance
        ));
        if let Some(code) = evaluated.submission.code.as_deref().filter(|c| !c.trim().is_empty()) {
            html.push_str("<pre><code>");
            html.push_str(&html_escape(code));
            html.push_str("</code></pre>\n");
        }
        html.push_str("</details>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn question_row(evaluated: &EvaluatedAnswer) -> String {
    let submission = &evaluated.submission;
    let source = evaluated
        .source
        .as_ref()
        .map(|s| s.label())
        .unwrap_or("-");

    match &evaluated.feedback {
        Some(feedback) => format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&submission.question_id),
            submission.question_type,
            source,
            score_class(feedback.score),
            feedback.score,
            feedback.response_type,
            bullet_list(&feedback.strengths),
            bullet_list(&feedback.improvements),
        ),
        None => format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>-</td><td>-</td><td></td><td></td></tr>\n",
            html_escape(&submission.question_id),
            submission.question_type,
            source,
        ),
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str(&format!("<li>{}</li>", html_escape(item)));
    }
    out.push_str("</ul>");
    out
}

fn format_duration(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

fn generate_bar_chart(categories: &CategoryPercentages) -> String {
    let bar_height = 26;
    let max_width = 400;
    let padding = 10;
    let label_width = 160;

    let entries = categories.entries();
    let total_height = entries.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"Category percentages\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, percent)) in entries.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = usize::from(*percent) * max_width / 100;

        let color = match score_class(*percent) {
            "pass" => "#22c55e",
            "warn" => "#eab308",
            _ => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            percent
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.overall { display: inline-block; padding: 0.5rem 1rem; border-radius: 8px; font-size: 1.25rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
td ul { margin: 0; padding-left: 1.2rem; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = Number(va), nb = Number(vb);
    const cmp = !isNaN(na) && !isNaN(nb) ? na - nb : va.localeCompare(vb);
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::aggregate::calculate_final_results;
    use grader_core::fallback::generate_fallback_feedback;
    use grader_core::feedback::FeedbackRecord;
    use grader_core::model::{AnswerSubmission, QuestionType};
    use grader_core::report::SessionInfo;
    use grader_core::results::FeedbackSource;

    fn make_test_report() -> SessionReport {
        let mut coding = AnswerSubmission::new("c1", QuestionType::Coding, "");
        coding.code = Some("if (a < b && b > c) { return a; }".into());
        coding.question = Some("Write <min> of three".into());
        let coding_feedback =
            generate_fallback_feedback("coding", "", coding.code.as_deref(), None, None);

        let mut skipped = AnswerSubmission::new("b1", QuestionType::Behavioral, "");
        skipped.skipped = true;

        let evaluations = vec![
            EvaluatedAnswer::new(coding, coding_feedback, FeedbackSource::Heuristic),
            EvaluatedAnswer::new(skipped, FeedbackRecord::skipped(), FeedbackSource::Skipped),
        ];
        let summary = calculate_final_results(&evaluations, 2700);

        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            session: SessionInfo {
                id: "session-1".into(),
                title: "Frontend <practice> round".into(),
                candidate_id: Some("cand-9".into()),
                question_count: 2,
            },
            evaluations,
            summary,
            duration_ms: 12,
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("session-1"));
        assert!(html.contains("cand-9"));
        assert!(html.contains("<td>c1</td>"));
        assert!(html.contains("problemSolving"));
        assert!(html.contains("<svg"));
        assert!(html.contains("45m 00s"));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Frontend &lt;practice&gt; round"));
        assert!(!html.contains("Frontend <practice> round"));
        assert!(html.contains("Write &lt;min&gt; of three"));
        assert!(html.contains("a &lt; b &amp;&amp; b &gt; c"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3725), "1h 02m");
    }
}
