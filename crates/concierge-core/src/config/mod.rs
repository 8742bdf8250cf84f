//! Configuration management

use crate::error::{ConciergeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Admission control for the chat endpoint
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Assistant behaviour (prompting, grounding, deadlines)
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (1536 for text-embedding-3-small)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for chat completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("CONCIERGE_LLM_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("CONCIERGE_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("CONCIERGE_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("CONCIERGE_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("CONCIERGE_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("CONCIERGE_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "text-embedding-3-small".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

/// Rate limit settings applied per caller key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Tracked key count above which expired entries are swept
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_threshold: default_sweep_threshold(),
        }
    }
}

fn default_max_requests() -> u32 {
    20
}

/// Longest accepted rate-limit window (one year)
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

fn default_window_secs() -> u64 {
    60
}

fn default_sweep_threshold() -> usize {
    1000
}

/// Assistant prompting and deadline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Company name interpolated into the default system prompt
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Replaces the built-in system prompt entirely when set
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Knowledge entries retrieved to ground each turn
    #[serde(default = "default_grounding_limit")]
    pub grounding_limit: usize,

    /// Knowledge entries returned by the search_knowledge_base tool
    #[serde(default = "default_tool_search_limit")]
    pub tool_search_limit: usize,

    #[serde(default = "default_embedding_timeout")]
    pub embedding_timeout_secs: u64,

    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl AssistantConfig {
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            system_prompt: None,
            grounding_limit: default_grounding_limit(),
            tool_search_limit: default_tool_search_limit(),
            embedding_timeout_secs: default_embedding_timeout(),
            completion_timeout_secs: default_completion_timeout(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

fn default_company_name() -> String {
    "our company".to_string()
}

fn default_grounding_limit() -> usize {
    5
}

fn default_tool_search_limit() -> usize {
    3
}

fn default_embedding_timeout() -> u64 {
    10
}

fn default_completion_timeout() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    15
}

impl Config {
    /// Load config from `CONCIERGE_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONCIERGE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from an explicit path, defaulting when the file is absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Reject settings that would make every turn fail or never expire
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_secs == 0 {
            return Err(ConciergeError::Config(
                "rate_limit.window_secs must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.window_secs > MAX_WINDOW_SECS {
            return Err(ConciergeError::Config(format!(
                "rate_limit.window_secs must be at most {}",
                MAX_WINDOW_SECS
            )));
        }
        let assistant = &self.assistant;
        if assistant.embedding_timeout_secs == 0
            || assistant.completion_timeout_secs == 0
            || assistant.tool_timeout_secs == 0
        {
            return Err(ConciergeError::Config(
                "assistant timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.assistant.grounding_limit, 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "rate_limit:\n  max_requests: 2\nassistant:\n  company_name: Acme\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests, 2);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(config.assistant.company_name, "Acme");
        assert_eq!(config.assistant.tool_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_zero_window_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "rate_limit:\n  window_secs: 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
        assert_eq!(err.exit_code(), crate::error::exit_codes::INVALID_INPUT);
    }

    #[test]
    fn test_oversized_window_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "rate_limit:\n  window_secs: 10000000000000\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));

        let mut config = Config::default();
        config.rate_limit.window_secs = MAX_WINDOW_SECS;
        assert!(config.validate().is_ok());
    }
}
