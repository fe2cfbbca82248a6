//! Mock scorer for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use grader_core::error::ScorerError;
use grader_core::normalize::RawFeedback;
use grader_core::traits::{FeedbackScorer, ScoreRequest};

/// A mock scorer for exercising the engine without real API calls.
///
/// Returns configurable responses based on prompt content matching, and
/// can be told to fail its first calls.
pub struct MockScorer {
    /// Map of prompt substring → feedback.
    responses: HashMap<String, RawFeedback>,
    /// Default feedback if no prompt matches.
    default_response: RawFeedback,
    /// Calls that still fail before responses are returned.
    failures_remaining: AtomicU32,
    /// Fail with a permanent error instead of a transient one.
    permanent_failure: bool,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockScorer {
    /// Create a new mock scorer with the given prompt→feedback mappings.
    pub fn new(responses: HashMap<String, RawFeedback>) -> Self {
        Self {
            responses,
            default_response: RawFeedback::Text(r#"{"score": 50}"#.to_string()),
            failures_remaining: AtomicU32::new(0),
            permanent_failure: false,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same feedback.
    pub fn with_fixed_response(response: impl Into<RawFeedback>) -> Self {
        Self {
            default_response: response.into(),
            ..Self::new(HashMap::new())
        }
    }

    /// Fail the first `n` calls with a transient network error.
    pub fn failing_first(mut self, n: u32) -> Self {
        self.failures_remaining = AtomicU32::new(n);
        self.permanent_failure = false;
        self
    }

    /// Fail every call with an authentication error.
    pub fn always_unauthorized(mut self) -> Self {
        self.failures_remaining = AtomicU32::new(u32::MAX);
        self.permanent_failure = true;
        self
    }

    /// Get the number of calls made to this scorer.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this scorer.
    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl FeedbackScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<RawFeedback> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(if self.permanent_failure {
                ScorerError::AuthenticationFailed("mock credentials rejected".into())
            } else {
                ScorerError::NetworkError("mock connection reset".into())
            }
            .into());
        }

        // Find a matching response based on prompt content
        let feedback = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(feedback)
    }
}
