//! grader CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "grader", version, about = "Interview answer evaluation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate interview sessions
    Evaluate {
        /// Path to a .toml/.json session file or a directory of them
        #[arg(long)]
        session: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scorer name from the config (default: the config's default_scorer)
        #[arg(long)]
        scorer: Option<String>,

        /// Use heuristic feedback only, never call an AI scorer
        #[arg(long)]
        offline: bool,

        /// Max answers evaluated concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (default: the config's output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all, none
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Run the answer gate on a single response
    Check {
        /// Question type (synonyms such as "behaviour" are accepted)
        #[arg(long)]
        question_type: String,

        /// Response text
        #[arg(long, default_value = "")]
        text: String,

        /// File holding submitted code
        #[arg(long)]
        code_file: Option<PathBuf>,

        /// Also print heuristic feedback for the response
        #[arg(long)]
        feedback: bool,
    },

    /// Normalize raw AI feedback into the canonical schema
    Normalize {
        /// Feedback file, or "-" for stdin
        #[arg(long)]
        input: String,

        /// Include the coding metric groups
        #[arg(long)]
        coding: bool,
    },

    /// Aggregate a JSON list of evaluated answers into a session summary
    Summarize {
        /// JSON file holding an array of evaluated answers
        #[arg(long)]
        input: PathBuf,

        /// Interview length in seconds
        #[arg(long, default_value = "0")]
        duration: u64,
    },

    /// Compare two session reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Change threshold in score points
        #[arg(long, default_value = "5.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate session files
    Validate {
        /// Path to a session file or directory
        #[arg(long)]
        session: PathBuf,
    },

    /// Create starter config and example session
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grader=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            session,
            config,
            scorer,
            offline,
            parallelism,
            output,
            format,
        } => {
            commands::evaluate::execute(commands::evaluate::EvaluateArgs {
                session_path: session,
                config_path: config,
                scorer,
                offline,
                parallelism,
                output,
                format,
            })
            .await
        }
        Commands::Check {
            question_type,
            text,
            code_file,
            feedback,
        } => commands::check::execute(question_type, text, code_file, feedback),
        Commands::Normalize { input, coding } => commands::normalize::execute(input, coding),
        Commands::Summarize { input, duration } => commands::summarize::execute(input, duration),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { session } => commands::validate::execute(session),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
