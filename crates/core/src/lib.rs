//! MedQA Core Library
//!
//! Cross-lingual medical question answering:
//! - Query translation into the corpus language
//! - Full-text evidence retrieval
//! - Grounded, citation-bearing answer synthesis
//! - Retry policy for rate-limited upstreams
//! - Conversational context management

pub mod config;
pub mod errors;
pub mod genai;
pub mod pipeline;
pub mod retry;
pub mod search;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use genai::GenerativeClient;
pub use pipeline::{
    ChatResponse, FailureMode, PipelineOrchestrator, QuestionResponse, Role, Turn,
};
pub use retry::RetryPolicy;
pub use search::{RetrievedPassage, SearchClient};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
