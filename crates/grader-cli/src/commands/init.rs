//! The `grader init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("grader.toml").exists() {
        println!("grader.toml already exists, skipping.");
    } else {
        std::fs::write("grader.toml", SAMPLE_CONFIG)?;
        println!("Created grader.toml");
    }

    std::fs::create_dir_all("sessions")?;
    let example_path = Path::new("sessions/example.toml");
    if example_path.exists() {
        println!("sessions/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SESSION)?;
        println!("Created sessions/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export OPENAI_API_KEY or ANTHROPIC_API_KEY (or edit grader.toml)");
    println!("  2. Run: grader validate --session sessions/example.toml");
    println!("  3. Run: grader evaluate --session sessions/example.toml --offline");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# grader configuration

default_scorer = "openai"
use_ai = true
max_retries = 3
retry_delay_ms = 1000
parallelism = 4
output_dir = "./grader-results"

[rate_limit]
max_requests = 30
window_secs = 60

[scorers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4.1-mini"

[scorers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"
"#;

const EXAMPLE_SESSION: &str = r#"[session]
id = "example"
title = "Example Interview"
candidate_id = "candidate-1"
total_duration_secs = 1800

[[answers]]
question_id = "behavioral-1"
question_type = "behavioral"
question = "Tell me about a time you resolved a conflict on your team."
response_time = 140
response_text = """
In my previous role two engineers disagreed about the API design for a new
service. I set up a meeting where each presented their approach, and we
listed the tradeoffs together. As a result we agreed on a hybrid design and
shipped two weeks early. I learned that making the tradeoffs visible helps
the team decide.
"""

[[answers]]
question_id = "technical-1"
question_type = "technical"
question = "What is the difference between a process and a thread?"
response_time = 95
response_text = """
A process has its own address space, while threads share the memory of the
process they belong to. For example, threads can communicate through shared
data structures but need synchronization such as a mutex. Context switching
between threads is usually cheaper because the memory mapping stays the same.
"""

[[answers]]
question_id = "coding-1"
question_type = "coding"
question = "Return the indices of two numbers that add up to a target."
language = "python"
response_time = 420
code = """
def two_sum(nums, target):
    seen = {}
    for i, n in enumerate(nums):
        if target - n in seen:
            return [seen[target - n], i]
        seen[n] = i
    return []
"""

[answers.execution_result]
output = "[0, 1]"

[answers.starter_code]
python = "def two_sum(nums, target):\n    pass\n"

[[answers]]
question_id = "coding-2"
question_type = "coding"
question = "Reverse a linked list."
skipped = true
"#;
