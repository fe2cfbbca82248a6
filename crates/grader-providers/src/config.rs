//! Scorer configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use grader_core::engine::EvaluationConfig;
use grader_core::normalize::RawFeedback;
use grader_core::rate_limit::RateLimiter;
use grader_core::traits::FeedbackScorer;

use crate::anthropic::AnthropicScorer;
use crate::mock::MockScorer;
use crate::openai::OpenAiScorer;

/// Configuration for a single AI scorer.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScorerConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Canned feedback, for demos and dry runs.
    Mock {
        #[serde(default = "default_mock_response")]
        response: String,
    },
}

impl std::fmt::Debug for ScorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScorerConfig::OpenAI {
                api_key: _,
                model,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ScorerConfig::Anthropic {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            ScorerConfig::Mock { response } => {
                f.debug_struct("Mock").field("response", response).finish()
            }
        }
    }
}

fn default_mock_response() -> String {
    r#"{"score": 50}"#.to_string()
}

/// Per-candidate cap on scorer calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_window_secs() -> u64 {
    60
}

/// Top-level grader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Scorer configurations keyed by name.
    #[serde(default)]
    pub scorers: HashMap<String, ScorerConfig>,
    /// Scorer used when none is named on the command line.
    #[serde(default = "default_scorer")]
    pub default_scorer: String,
    /// Ask the AI scorer at all. When false every answer gets heuristic feedback.
    #[serde(default = "default_true")]
    pub use_ai: bool,
    /// Max retries on transient scorer errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max answers evaluated concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_scorer() -> String {
    "openai".to_string()
}
fn default_true() -> bool {
    true
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./grader-results")
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            scorers: HashMap::new(),
            default_scorer: default_scorer(),
            use_ai: true,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            rate_limit: None,
            output_dir: default_output_dir(),
        }
    }
}

impl GraderConfig {
    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            parallelism: self.parallelism,
            use_ai: self.use_ai,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            rate_limiter: self.rate_limit.as_ref().map(|rl| {
                Arc::new(RateLimiter::new(
                    rl.max_requests,
                    Duration::from_secs(rl.window_secs),
                ))
            }),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find("${") {
        let start = search_from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        search_from = start + value.len();
    }
    result
}

/// Resolve env vars in a scorer config.
fn resolve_scorer_config(config: &ScorerConfig) -> ScorerConfig {
    let resolve_opt = |v: &Option<String>| v.as_ref().map(|s| resolve_env_vars(s));
    match config {
        ScorerConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => ScorerConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: resolve_opt(model),
            base_url: resolve_opt(base_url),
            org_id: resolve_opt(org_id),
        },
        ScorerConfig::Anthropic {
            api_key,
            model,
            base_url,
        } => ScorerConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            model: resolve_opt(model),
            base_url: resolve_opt(base_url),
        },
        ScorerConfig::Mock { response } => ScorerConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `grader.toml` in the current directory
/// 2. `~/.config/grader/config.toml`
///
/// Environment variable overrides: `GRADER_OPENAI_KEY`, `GRADER_ANTHROPIC_KEY`.
pub fn load_config() -> Result<GraderConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GraderConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("grader.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GraderConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.scorers = config
        .scorers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_scorer_config(v)))
        .collect();

    Ok(config)
}

/// Parse a config document without touching the environment.
pub fn parse_config(content: &str) -> Result<GraderConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_env_overrides(config: &mut GraderConfig) {
    if let Ok(key) = std::env::var("GRADER_ANTHROPIC_KEY") {
        let entry = config
            .scorers
            .entry("anthropic".into())
            .or_insert(ScorerConfig::Anthropic {
                api_key: String::new(),
                model: None,
                base_url: None,
            });
        if let ScorerConfig::Anthropic { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("GRADER_OPENAI_KEY") {
        let entry = config
            .scorers
            .entry("openai".into())
            .or_insert(ScorerConfig::OpenAI {
                api_key: String::new(),
                model: None,
                base_url: None,
                org_id: None,
            });
        if let ScorerConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("grader"))
}

/// Create a scorer instance from its configuration.
pub fn create_scorer(name: &str, config: &ScorerConfig) -> Result<Arc<dyn FeedbackScorer>> {
    match config {
        ScorerConfig::Anthropic {
            api_key,
            model,
            base_url,
        } => {
            ensure_key(name, api_key)?;
            Ok(Arc::new(AnthropicScorer::new(
                api_key,
                model.clone(),
                base_url.clone(),
            )))
        }
        ScorerConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => {
            ensure_key(name, api_key)?;
            Ok(Arc::new(OpenAiScorer::new(
                api_key,
                model.clone(),
                base_url.clone(),
                org_id.clone(),
            )))
        }
        ScorerConfig::Mock { response } => Ok(Arc::new(MockScorer::with_fixed_response(
            RawFeedback::Text(response.clone()),
        ))),
    }
}

fn ensure_key(name: &str, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!("scorer '{name}' has no API key configured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_GRADER_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_GRADER_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_GRADER_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_GRADER_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_unset_and_unterminated() {
        assert_eq!(resolve_env_vars("a${_GRADER_SURELY_UNSET}b"), "ab");
        assert_eq!(resolve_env_vars("key-${OPEN"), "key-${OPEN");
    }

    #[test]
    fn default_config() {
        let config = GraderConfig::default();
        assert_eq!(config.default_scorer, "openai");
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.max_retries, 3);
        assert!(config.use_ai);
        assert!(config.engine_config().rate_limiter.is_none());
    }

    #[test]
    fn parse_scorer_config() {
        let toml_str = r#"
default_scorer = "anthropic"
parallelism = 2
retry_delay_ms = 250

[rate_limit]
max_requests = 10

[scorers.anthropic]
type = "anthropic"
api_key = "sk-test"
model = "claude-haiku-4-5-20251001"

[scorers.openai]
type = "openai"
api_key = "sk-openai"

[scorers.demo]
type = "mock"
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.scorers.len(), 3);
        assert_eq!(config.default_scorer, "anthropic");
        assert!(matches!(
            config.scorers.get("anthropic"),
            Some(ScorerConfig::Anthropic { model: Some(m), .. }) if m == "claude-haiku-4-5-20251001"
        ));
        assert!(matches!(
            config.scorers.get("demo"),
            Some(ScorerConfig::Mock { response }) if response == r#"{"score": 50}"#
        ));

        let engine = config.engine_config();
        assert_eq!(engine.parallelism, 2);
        assert_eq!(engine.retry_delay, Duration::from_millis(250));
        assert!(engine.rate_limiter.is_some());
    }

    #[test]
    fn debug_masks_keys() {
        let config = ScorerConfig::OpenAI {
            api_key: "sk-very-secret".into(),
            model: None,
            base_url: None,
            org_id: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grader.toml");
        std::fs::write(
            &path,
            "use_ai = false\n[scorers.demo]\ntype = \"mock\"\nresponse = \"{}\"\n",
        )
        .unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.use_ai);
        assert!(config.scorers.contains_key("demo"));

        let missing = dir.path().join("missing.toml");
        assert!(load_config_from(Some(&missing)).is_err());
    }

    #[test]
    fn factory_rejects_empty_keys() {
        let config = ScorerConfig::Anthropic {
            api_key: "  ".into(),
            model: None,
            base_url: None,
        };
        let err = create_scorer("anthropic", &config).err().unwrap();
        assert!(err.to_string().contains("no API key"));

        let mock = create_scorer("demo", &ScorerConfig::Mock { response: "{}".into() }).unwrap();
        assert_eq!(mock.name(), "mock");
    }
}
