//! grader-core: Answer evaluation and aggregation engine.
//!
//! This crate decides whether an interview answer is worth scoring,
//! produces heuristic feedback when no AI scorer is available, normalizes
//! any feedback into one canonical schema, and aggregates per-question
//! feedback into a session summary.

pub mod aggregate;
pub mod code_analysis;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod feedback;
pub mod gate;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod rate_limit;
pub mod report;
pub mod results;
pub mod text_analysis;
pub mod traits;
