//! grader-report: Report generation for grader.
//!
//! Renders evaluated interview sessions as self-contained HTML.

pub mod html;

pub use html::{generate_html, write_html_report};
