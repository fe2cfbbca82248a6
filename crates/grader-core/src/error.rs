//! Error types for grader.
//!
//! Scoring an answer never fails outright: whatever goes wrong with the AI
//! scorer, the engine falls back to heuristic feedback. `ScorerError` tells
//! the engine whether another attempt is worth making first, so it is
//! downcast from `anyhow::Error` rather than matched on message text.

use thiserror::Error;

/// Why an AI scorer produced no feedback for an answer.
#[derive(Debug, Error)]
pub enum ScorerError {
    /// The scorer's quota is spent for now (HTTP 429).
    #[error("scorer rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The scorer rejected our credentials. Retrying cannot help.
    #[error("scorer rejected credentials: {0}")]
    AuthenticationFailed(String),

    /// The configured model does not exist. Retrying cannot help.
    #[error("scoring model not found: {0}")]
    ModelNotFound(String),

    /// Any other non-success HTTP status.
    #[error("scorer returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The response body was not the shape the scorer's API documents.
    #[error("malformed scorer response: {0}")]
    MalformedResponse(String),

    /// The scorer answered with no feedback text at all.
    #[error("scorer returned empty feedback")]
    EmptyFeedback,

    #[error("scorer timed out after {0}s")]
    Timeout(u64),

    #[error("network error reaching scorer: {0}")]
    NetworkError(String),
}

impl ScorerError {
    /// Permanent errors go straight to heuristic feedback; everything else
    /// is retried up to the configured limit.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ScorerError::AuthenticationFailed(_) | ScorerError::ModelNotFound(_)
        )
    }

    /// Delay the scorer asked for, in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ScorerError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Input that cannot be evaluated at all.
///
/// The scoring path itself never fails; this is reserved for inputs of the
/// wrong shape, such as a response list that is not a list.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_credential_and_model_errors_are_permanent() {
        assert!(ScorerError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ScorerError::ModelNotFound("gpt-0".into()).is_permanent());
        assert!(!ScorerError::Timeout(30).is_permanent());
        assert!(!ScorerError::RateLimited { retry_after_ms: 10 }.is_permanent());
        assert!(!ScorerError::EmptyFeedback.is_permanent());
        assert!(!ScorerError::MalformedResponse("missing choices".into()).is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        let err = ScorerError::RateLimited {
            retry_after_ms: 2500,
        };
        assert_eq!(err.retry_after_ms(), Some(2500));
        assert_eq!(err.to_string(), "scorer rate limited, retry after 2500ms");
        assert_eq!(ScorerError::EmptyFeedback.retry_after_ms(), None);
    }
}
