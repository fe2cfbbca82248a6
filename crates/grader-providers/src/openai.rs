//! OpenAI chat completions scorer.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use grader_core::normalize::RawFeedback;
use grader_core::traits::{FeedbackScorer, ScoreRequest};

use crate::error::{check_status, nested_error_message, send_error, ScorerError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// OpenAI-compatible API scorer.
pub struct OpenAiScorer {
    api_key: String,
    model: String,
    base_url: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiScorer {
    pub fn new(
        api_key: &str,
        model: Option<String>,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            org_id,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl FeedbackScorer for OpenAiScorer {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model, question = %request.question_id))]
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<RawFeedback> {
        let start = Instant::now();

        let body = OpenAiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                OpenAiMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, &self.model, nested_error_message).await?;

        let api_response: OpenAiResponse =
            response.json().await.map_err(|e| ScorerError::MalformedResponse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

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

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::model::{AnswerSubmission, QuestionType};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ScoreRequest {
        ScoreRequest::for_answer(&AnswerSubmission::new(
            "q1",
            QuestionType::Technical,
            "Indexes speed up reads because they avoid full table scans.",
        ))
    }

    #[tokio::test]
    async fn successful_scoring() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "{\"score\": 81, \"strengths\": [\"precise\"]}", "role": "assistant"}, "index": 0}],
            "model": "gpt-4.1-mini",
            "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4.1-mini",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new("test-key", None, Some(server.uri()), None);
        let raw = scorer.score(&request()).await.unwrap();
        match raw {
            RawFeedback::Text(text) => assert!(text.contains("\"score\": 81")),
            other => panic!("expected text feedback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn organization_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("OpenAI-Organization", "org-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{}"}}]
            })))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new(
            "key",
            Some("gpt-4.1".into()),
            Some(server.uri()),
            Some("org-123".into()),
        );
        assert_eq!(scorer.model(), "gpt-4.1");
        assert!(scorer.score(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn error_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new("key", None, Some(server.uri()), None);
        let err = scorer.score(&request()).await.unwrap_err();
        let scorer_err = err.downcast_ref::<ScorerError>().unwrap();
        assert!(matches!(scorer_err, ScorerError::ApiError { status: 500, .. }));
        assert!(!scorer_err.is_permanent());
    }

    #[tokio::test]
    async fn unknown_model_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "The model does not exist"}
            })))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new("key", Some("gpt-9".into()), Some(server.uri()), None);
        let err = scorer.score(&request()).await.unwrap_err();
        let scorer_err = err.downcast_ref::<ScorerError>().unwrap();
        assert!(matches!(scorer_err, ScorerError::ModelNotFound(m) if m == "gpt-9"));
        assert!(scorer_err.is_permanent());
    }

    #[tokio::test]
    async fn empty_or_malformed_replies_are_retryable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "   "}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let empty = OpenAiScorer::new("empty", None, Some(server.uri()), None);
        let err = empty.score(&request()).await.unwrap_err();
        let scorer_err = err.downcast_ref::<ScorerError>().unwrap();
        assert!(matches!(scorer_err, ScorerError::EmptyFeedback));
        assert!(!scorer_err.is_permanent());

        let garbled = OpenAiScorer::new("garbled", None, Some(server.uri()), None);
        let err = garbled.score(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScorerError>(),
            Some(ScorerError::MalformedResponse(_))
        ));
    }
}
