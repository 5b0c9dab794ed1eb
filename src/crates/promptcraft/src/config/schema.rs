//! Configuration schema for promptcraft

use crate::error::{Result, WorkflowError};
use llm::{RemoteLlmConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

const REDACTED: &str = "********";

/// Main promptcraft configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PromptCraftConfig {
    /// Model service settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Graph execution settings
    #[serde(default)]
    pub workflow: WorkflowSettings,

    /// Retry policy for model calls
    #[serde(default)]
    pub retry: RetrySettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Model service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API root
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// API key, may be `${VAR}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: llm::remote::GROQ_BASE_URL.to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Graph execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Critique/improve cycles allowed before the evaluator result is accepted
    pub max_critique_rounds: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_critique_rounds: 3,
        }
    }
}

/// Retry settings, mirrored into [`RetryPolicy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub initial_interval_secs: f64,
    pub backoff_factor: f64,
    pub max_interval_secs: f64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval_secs: 0.5,
            backoff_factor: 2.0,
            max_interval_secs: 30.0,
            jitter: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn max_level(&self) -> Result<tracing::Level> {
        tracing::Level::from_str(&self.level)
            .map_err(|_| WorkflowError::Config(format!("Unknown log level '{}'", self.level)))
    }
}

impl PromptCraftConfig {
    /// Parse a TOML document; missing sections and keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve `${VAR_NAME}` references from the environment.
    ///
    /// An API key that names an unset variable is dropped so the
    /// [`API_KEY_ENV`] fallback applies.
    pub fn resolve_env_vars(&mut self) {
        if let Some(base_url) = expand_env_var(&self.llm.base_url) {
            self.llm.base_url = base_url;
        }
        if let Some(model) = expand_env_var(&self.llm.model) {
            self.llm.model = model;
        }
        self.llm.api_key = self.llm.api_key.as_deref().and_then(expand_env_var);
    }

    /// Check value ranges before anything is built from this config.
    pub fn validate(&self) -> Result<()> {
        if self.llm.base_url.trim().is_empty() {
            return Err(WorkflowError::Config("llm.base_url must not be empty".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(WorkflowError::Config("llm.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(WorkflowError::Config(format!(
                "llm.temperature must be within [0.0, 2.0], got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(WorkflowError::Config("llm.timeout_secs must be positive".into()));
        }
        llm::retry::validate(&self.retry_policy())
            .map_err(|e| WorkflowError::Config(e.to_string()))?;
        self.logging.max_level()?;
        Ok(())
    }

    /// The configured key, else the [`API_KEY_ENV`] variable.
    pub fn api_key(&self) -> Result<String> {
        let key = match &self.llm.api_key {
            Some(key) => key.clone(),
            None => std::env::var(API_KEY_ENV).map_err(|_| {
                WorkflowError::Config(format!(
                    "No API key configured; set llm.api_key or {}",
                    API_KEY_ENV
                ))
            })?,
        };
        if key.trim().is_empty() {
            return Err(WorkflowError::Config("API key must not be empty".into()));
        }
        Ok(key)
    }

    /// Provider client settings.
    pub fn to_remote_config(&self) -> Result<RemoteLlmConfig> {
        Ok(
            RemoteLlmConfig::new(self.api_key()?, &self.llm.base_url, &self.llm.model)
                .with_timeout(Duration::from_secs(self.llm.timeout_secs)),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts)
            .with_initial_interval(self.retry.initial_interval_secs)
            .with_backoff_factor(self.retry.backoff_factor)
            .with_max_interval(self.retry.max_interval_secs)
            .with_jitter(self.retry.jitter)
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.llm.api_key.is_some() {
            config.llm.api_key = Some(REDACTED.to_string());
        }
        config
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WorkflowError::Config(e.to_string()))
    }
}

/// `Some(value)` for plain strings and set variables, `None` for `${VAR}`
/// with `VAR` unset.
fn expand_env_var(value: &str) -> Option<String> {
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).ok(),
        None => Some(value.to_string()),
    }
}
