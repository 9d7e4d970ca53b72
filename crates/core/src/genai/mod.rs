//! Generative-text service abstraction
//!
//! Provides a unified interface over free-text generation providers:
//! - Google Gemini (generateContent REST API)
//! - Mock client for testing

use crate::config::GenAiConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for free-text generation
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate text for a single free-text instruction
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Gemini generateContent client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client from configuration
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "Missing GEMINI_API_KEY/GOOGLE_API_KEY".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || body.contains("RESOURCE_EXHAUSTED") {
                return Err(AppError::RateLimited {
                    service: "gemini".to_string(),
                    message: format!("API error {}: {}", status, body),
                });
            }
            return Err(AppError::Generation {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GeminiResponse =
            response.json().await.map_err(|e| AppError::Generation {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text = result
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| AppError::Generation {
                message: "Empty response".to_string(),
            })?;

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock generative client for testing.
///
/// Replays a script of responses; once the script runs out it keeps
/// answering with the configured default, or a rate-limit error if none
/// was set. Every prompt is recorded for assertions.
pub struct MockGenerativeClient {
    script: Mutex<VecDeque<Result<String>>>,
    default_response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerativeClient {
    /// A client that always returns the same response
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_response: Some(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A client that replays the given results in order, then rate-limits
    pub fn scripted(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A client that fails every call with a rate-limit error
    pub fn always_rate_limited() -> Self {
        Self::scripted(Vec::new())
    }

    /// Prompts seen so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeClient for MockGenerativeClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(result) = self.script.lock().unwrap().pop_front() {
            return result;
        }

        match &self.default_response {
            Some(text) => Ok(text.clone()),
            None => Err(AppError::RateLimited {
                service: "mock".to_string(),
                message: "script exhausted".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-generative"
    }
}
