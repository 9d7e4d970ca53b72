//! Configuration management for the MedQA core
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Generative-text service configuration
    #[serde(default)]
    pub genai: GenAiConfig,

    /// Full-text search index configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pipeline tuning knobs
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenAiConfig {
    /// API key for the generative service (GEMINI_API_KEY / GOOGLE_API_KEY
    /// are honored as fallbacks when unset here)
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_genai_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_genai_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_genai_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Search endpoint URL (index `_search` endpoint)
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum attempts against a rate-limited upstream
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in seconds; the wait grows linearly per attempt
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Result budget for the single-shot question flow
    #[serde(default = "default_question_topk")]
    pub question_topk: usize,

    /// Result budget for the conversational flow
    #[serde(default = "default_chat_topk")]
    pub chat_topk: usize,
}

// Default value functions
fn default_genai_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_genai_model() -> String { "gemini-2.0-flash-exp".to_string() }
fn default_genai_timeout() -> u64 { 30 }
fn default_search_url() -> String {
    "http://localhost:9200/knowledge/_search".to_string()
}
fn default_search_timeout() -> u64 { 30 }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay() -> u64 { 2 }
fn default_question_topk() -> usize { 8 }
fn default_chat_topk() -> usize { 5 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        // Read a local .env if present before the environment source runs
        let _ = dotenvy::dotenv();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__GENAI__MODEL=gemini-2.0-flash-exp
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: AppConfig = config.try_deserialize()?;

        // Same key fallbacks the original deployment used
        if cfg.genai.api_key.is_none() {
            cfg.genai.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .ok();
        }

        Ok(cfg)
    }

    /// Get the generative-service timeout as Duration
    pub fn genai_timeout(&self) -> Duration {
        Duration::from_secs(self.genai.timeout_secs)
    }

    /// Get the search timeout as Duration
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    /// Get the base backoff delay as Duration
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.retry.base_delay_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            genai: GenAiConfig::default(),
            search: SearchConfig::default(),
            retry: RetryConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_genai_base(),
            model: default_genai_model(),
            timeout_secs: default_genai_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            question_topk: default_question_topk(),
            chat_topk: default_chat_topk(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.pipeline.question_topk, 8);
        assert_eq!(config.pipeline.chat_topk, 5);
    }

    #[test]
    fn test_duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.base_delay(), Duration::from_secs(2));
        assert_eq!(config.genai_timeout(), Duration::from_secs(30));
    }
}
