//! Anthropic messages API scorer.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use grader_core::normalize::RawFeedback;
use grader_core::traits::{FeedbackScorer, ScoreRequest};

use crate::error::{check_status, nested_error_message, send_error, ScorerError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic API scorer.
pub struct AnthropicScorer {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicScorer {
    pub fn new(api_key: &str, model: Option<String>, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl FeedbackScorer for AnthropicScorer {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %self.model, question = %request.question_id))]
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<RawFeedback> {
        let start = Instant::now();

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, &self.model, nested_error_message).await?;

        let api_response: AnthropicResponse =
            response.json().await.map_err(|e| ScorerError::MalformedResponse(e.to_string()))?;

        let content: String = api_response
            .content
            .into_iter()
            .filter(|c| c.kind.is_empty() || c.kind == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "feedback received"
        );
        if content.trim().is_empty() {
            return Err(ScorerError::EmptyFeedback.into());
        }
        Ok(RawFeedback::Text(content))
    }
}
