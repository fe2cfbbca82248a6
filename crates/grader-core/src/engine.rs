//! Session evaluation orchestrator.
//!
//! Evaluates every answer of an interview session concurrently, choosing
//! the feedback source per answer, then aggregates the results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::aggregate::calculate_final_results;
use crate::error::ScorerError;
use crate::fallback::generate_fallback_feedback;
use crate::feedback::FeedbackRecord;
use crate::gate::{assess_answer, GateVerdict};
use crate::model::{AnswerSubmission, InterviewSession};
use crate::normalize::{process_feedback, RawFeedback};
use crate::rate_limit::RateLimiter;
use crate::report::{SessionInfo, SessionReport};
use crate::results::{EvaluatedAnswer, FeedbackSource};
use crate::traits::{FeedbackScorer, ScoreRequest};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the evaluation engine.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Maximum answers evaluated at once.
    pub parallelism: usize,
    /// Ask the AI scorer, if one is configured. When off, every answered
    /// question gets heuristic feedback.
    pub use_ai: bool,
    /// Retries on transient scorer errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub retry_delay: Duration,
    /// Caps scorer calls per candidate. Over-limit answers fall back to
    /// heuristics.
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            use_ai: true,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            rate_limiter: None,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_answer_start(&self, question_id: &str);
    fn on_answer_complete(&self, evaluated: &EvaluatedAnswer);
    fn on_scorer_error(&self, question_id: &str, error: &str);
    fn on_session_complete(&self, total: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_answer_start(&self, _: &str) {}
    fn on_answer_complete(&self, _: &EvaluatedAnswer) {}
    fn on_scorer_error(&self, _: &str, _: &str) {}
    fn on_session_complete(&self, _: usize, _: Duration) {}
}

/// The session evaluation engine.
pub struct EvaluationEngine {
    scorer: Option<Arc<dyn FeedbackScorer>>,
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(scorer: Option<Arc<dyn FeedbackScorer>>, config: EvaluationConfig) -> Self {
        Self { scorer, config }
    }

    /// Engine that never calls an AI scorer.
    pub fn offline() -> Self {
        Self::new(
            None,
            EvaluationConfig {
                use_ai: false,
                ..EvaluationConfig::default()
            },
        )
    }

    /// Evaluate every answer in a session and aggregate the results.
    pub async fn run(
        &self,
        session: &InterviewSession,
        progress: &dyn ProgressReporter,
    ) -> Result<SessionReport> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let candidate = session.candidate_id.as_deref().unwrap_or(&session.id);
        if let Some(limiter) = &self.config.rate_limiter {
            let tracked = limiter.prune();
            tracing::debug!(tracked, "expired rate limit windows pruned");
        }

        let mut futures = FuturesUnordered::new();
        for (index, answer) in session.answers.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                progress.on_answer_start(&answer.question_id);
                let evaluated = self.evaluate_answer(answer, candidate, progress).await;
                Ok::<_, anyhow::Error>((index, evaluated))
            });
        }

        let mut slots: Vec<Option<EvaluatedAnswer>> = vec![None; session.answers.len()];
        while let Some(result) = futures.next().await {
            let (index, evaluated) = result?;
            progress.on_answer_complete(&evaluated);
            slots[index] = Some(evaluated);
        }
        let evaluations: Vec<EvaluatedAnswer> = slots.into_iter().flatten().collect();

        let elapsed = start.elapsed();
        progress.on_session_complete(evaluations.len(), elapsed);

        let summary = calculate_final_results(&evaluations, session.total_duration_secs);
        tracing::info!(
            session = %session.id,
            score = summary.score,
            answered = summary.breakdown.answered_questions,
            "session evaluated"
        );

        Ok(SessionReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            session: SessionInfo::from_session(session),
            evaluations,
            summary,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Produce feedback for a single answer. Never fails: every scorer
    /// problem degrades to heuristic feedback.
    pub async fn evaluate_answer(
        &self,
        answer: &AnswerSubmission,
        candidate: &str,
        progress: &dyn ProgressReporter,
    ) -> EvaluatedAnswer {
        let is_coding = answer.question_type.is_coding();

        if answer.skipped {
            return EvaluatedAnswer::new(
                answer.clone(),
                FeedbackRecord::skipped(),
                FeedbackSource::Skipped,
            );
        }

        if let GateVerdict::Rejected(reason) = assess_answer(
            &answer.response_text,
            answer.question_type,
            answer.code.as_deref(),
        ) {
            let reason = reason.to_string();
            return EvaluatedAnswer::new(
                answer.clone(),
                FeedbackRecord::insufficient(&reason),
                FeedbackSource::Rejected { reason },
            );
        }

        if let Some(recorded) = &answer.recorded_feedback {
            let raw = RawFeedback::from(recorded.clone());
            return EvaluatedAnswer::new(
                answer.clone(),
                process_feedback(&raw, is_coding),
                FeedbackSource::Recorded,
            );
        }

        if let Some(scorer) = self.scorer.as_ref().filter(|_| self.config.use_ai) {
            let allowed = self
                .config
                .rate_limiter
                .as_ref()
                .map_or(true, |limiter| limiter.check(candidate));
            if !allowed {
                tracing::warn!(
                    question = %answer.question_id,
                    candidate,
                    "scorer rate limit reached, using heuristic feedback"
                );
            } else {
                let request = ScoreRequest::for_answer(answer);
                match self.score_with_retries(scorer.as_ref(), &request).await {
                    Ok(raw) => {
                        return EvaluatedAnswer::new(
                            answer.clone(),
                            process_feedback(&raw, is_coding),
                            FeedbackSource::Ai {
                                scorer: scorer.name().to_string(),
                            },
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            question = %answer.question_id,
                            "scorer failed, using heuristic feedback: {e:#}"
                        );
                        progress.on_scorer_error(&answer.question_id, &e.to_string());
                    }
                }
            }
        }

        EvaluatedAnswer::new(answer.clone(), heuristic_feedback(answer), FeedbackSource::Heuristic)
    }

    /// Call the scorer, retrying transient errors with exponential backoff.
    async fn score_with_retries(
        &self,
        scorer: &dyn FeedbackScorer,
        request: &ScoreRequest,
    ) -> Result<RawFeedback> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;
        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match scorer.score(request).await {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    if let Some(scorer_err) = e.downcast_ref::<ScorerError>() {
                        if scorer_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = scorer_err.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                        }
                    }
                    tracing::debug!(
                        question = %request.question_id,
                        attempt = retry + 1,
                        "scorer attempt failed: {e:#}"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("scorer returned no result")))
    }
}

/// Heuristic feedback for an answer that passed the gate.
pub fn heuristic_feedback(answer: &AnswerSubmission) -> FeedbackRecord {
    generate_fallback_feedback(
        answer.question_type.as_str(),
        &answer.response_text,
        answer.code.as_deref(),
        answer.language.as_deref(),
        answer.execution_result.as_ref(),
    )
}
