//! Question-answering pipeline
//!
//! Stages, leaf-first:
//! - Context window assembly
//! - Query translation (Vietnamese → English)
//! - Evidence retrieval from the knowledge index
//! - Grounded answer synthesis with the citation contract
//! - Diagnosis-context analysis
//! - Orchestration of the single-shot and conversational flows

pub mod context_window;
pub mod diagnosis;
pub mod orchestrator;
pub mod retriever;
pub mod synthesizer;
pub mod translator;

pub use context_window::{Role, Turn};
pub use diagnosis::{DiagnosisContext, RecommendationLevel};
pub use orchestrator::{ChatResponse, FailureMode, PipelineOrchestrator, QuestionResponse};
pub use retriever::Retriever;
pub use synthesizer::Synthesizer;
pub use translator::Translator;
