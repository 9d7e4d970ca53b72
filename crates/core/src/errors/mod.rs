//! Error types for the MedQA pipeline
//!
//! Provides:
//! - Distinct error types for the two upstream collaborators
//! - Rate-limit classification for the retry policy
//! - Conversions from transport and serialization errors

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream signalled temporary resource exhaustion (HTTP 429 class)
    #[error("Rate limited by {service}: {message}")]
    RateLimited { service: String, message: String },

    /// Generative-text service failure (non-retryable)
    #[error("Generative service error: {message}")]
    Generation { message: String },

    /// Full-text search service failure
    #[error("Search service error: {message}")]
    Search { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this failure is rate-limit-class and therefore eligible for
    /// backoff retry. Everything else is fatal for the current attempt.
    ///
    /// Besides the dedicated variant, the textual signature of a wrapped
    /// upstream error is inspected: Gemini surfaces quota exhaustion as
    /// "RESOURCE_EXHAUSTED" or a literal 429 in the error body.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            AppError::RateLimited { .. } => true,
            AppError::Generation { message } | AppError::Search { message } => {
                message.contains("RESOURCE_EXHAUSTED") || message.contains("429")
            }
            AppError::HttpClient(e) => e
                .status()
                .map(|s| s.as_u16() == 429)
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_variant() {
        let err = AppError::RateLimited {
            service: "gemini".into(),
            message: "quota exceeded".into(),
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_textual_signature() {
        let err = AppError::Generation {
            message: "status 429 Too Many Requests".into(),
        };
        assert!(err.is_rate_limited());

        let err = AppError::Generation {
            message: "RESOURCE_EXHAUSTED: per-minute quota".into(),
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_fatal_errors_not_retryable() {
        let err = AppError::Search {
            message: "connection refused".into(),
        };
        assert!(!err.is_rate_limited());

        let err = AppError::Internal {
            message: "bad state".into(),
        };
        assert!(!err.is_rate_limited());
    }
}
