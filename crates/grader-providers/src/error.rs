//! HTTP status mapping shared by the scorer implementations.

pub use grader_core::error::ScorerError;

/// Default wait when a 429 carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Map a failed send to a `ScorerError`.
pub(crate) fn send_error(err: reqwest::Error, timeout_secs: u64) -> ScorerError {
    if err.is_timeout() {
        ScorerError::Timeout(timeout_secs)
    } else {
        ScorerError::NetworkError(err.to_string())
    }
}

/// Pass successful responses through; turn error statuses into `ScorerError`.
///
/// `extract_message` pulls a readable message out of a provider's error body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    model: &str,
    extract_message: fn(&str) -> Option<String>,
) -> Result<reqwest::Response, ScorerError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
            * 1000;
        return Err(ScorerError::RateLimited {
            retry_after_ms: retry_after,
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or(body);
    Err(match status {
        401 | 403 => ScorerError::AuthenticationFailed(message),
        404 => ScorerError::ModelNotFound(model.to_string()),
        _ => ScorerError::ApiError { status, message },
    })
}

/// Error body shape used by both OpenAI and Anthropic: `{"error": {"message": ...}}`.
pub(crate) fn nested_error_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: Inner,
    }
    #[derive(serde::Deserialize)]
    struct Inner {
        message: String,
    }
    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|e| e.error.message)
}
