//! grader-providers: AI feedback scorer integrations.
//!
//! Implements the `FeedbackScorer` trait for OpenAI and Anthropic, plus a
//! mock scorer, and loads scorer configuration.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_scorer, load_config, load_config_from, GraderConfig, ScorerConfig};
pub use error::ScorerError;
