//! The `grader summarize` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use grader_core::aggregate::calculate_final_results_value;

pub fn execute(input: PathBuf, duration: u64) -> Result<()> {
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let responses: serde_json::Value =
        serde_json::from_str(&content).context("input is not valid JSON")?;

    let summary = calculate_final_results_value(&responses, duration)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
