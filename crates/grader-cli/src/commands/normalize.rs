//! The `grader normalize` command.

use std::io::Read;

use anyhow::{Context, Result};

use grader_core::normalize::{process_feedback, RawFeedback};

pub fn execute(input: String, coding: bool) -> Result<()> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read feedback from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&input)
            .with_context(|| format!("failed to read feedback from {input}"))?
    };

    let raw = match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(value) => RawFeedback::from(value),
        Err(_) => RawFeedback::Text(content),
    };

    let record = process_feedback(&raw, coding);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
