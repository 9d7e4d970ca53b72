//! Pipeline orchestration
//!
//! Composes translation, retrieval, and synthesis into the two supported
//! flows: the single-shot question flow and the conversational flow. One
//! orchestrator serves both; failure strictness is a construction-time
//! policy rather than a second implementation.

use crate::config::AppConfig;
use crate::errors::Result;
use crate::genai::{GeminiClient, GenerativeClient};
use crate::pipeline::context_window::{self, Turn};
use crate::pipeline::diagnosis::{self, DiagnosisContext};
use crate::pipeline::retriever::Retriever;
use crate::pipeline::synthesizer::{Synthesizer, FALLBACK_GENERIC};
use crate::pipeline::translator::Translator;
use crate::retry::RetryPolicy;
use crate::search::{ElasticClient, RetrievedPassage, SearchClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the orchestrator treats retrieval and synthesis failures.
///
/// Translation always degrades silently; the conversational flow always
/// degrades regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Retrieval and synthesis failures propagate as pipeline faults
    Strict,
    /// Failures degrade to empty evidence / the fallback answer
    Lenient,
}

/// Passages shown back to the caller in the single-shot preview
const EVIDENCE_PREVIEW_LIMIT: usize = 3;

/// Snippets returned alongside a chat response
const CHAT_SNIPPET_LIMIT: usize = 2;

/// Result of the single-shot question flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    /// The question as asked
    pub question: String,

    /// What was actually searched; empty when translation degraded
    pub translated_query: String,

    /// Result budget that was requested
    pub topk: usize,

    /// Synthesized answer, never empty
    pub answer: String,

    /// First retrieved passages, at most three
    pub evidence_preview: Vec<String>,
}

/// Result of the conversational flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply, never empty
    pub response: String,

    /// Structured clinical signals (stable shape, defaults for now)
    pub diagnosis_context: DiagnosisContext,

    /// Evidence backing the reply, at most two passages
    pub medical_snippets: Vec<String>,

    /// The translated query, surfaced for auditability
    pub symptoms_detected: String,
}

pub struct PipelineOrchestrator {
    translator: Translator,
    retriever: Retriever,
    synthesizer: Synthesizer,
    failure_mode: FailureMode,
    question_topk: usize,
    chat_topk: usize,
}

impl PipelineOrchestrator {
    /// Assemble a pipeline from explicit collaborators. Tests inject mocks
    /// here; production wiring goes through [`from_config`](Self::from_config).
    pub fn new(
        genai: Arc<dyn GenerativeClient>,
        search: Arc<dyn SearchClient>,
        config: &AppConfig,
        failure_mode: FailureMode,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);

        Self {
            translator: Translator::new(genai.clone(), retry.clone()),
            retriever: Retriever::new(search),
            synthesizer: Synthesizer::new(genai, retry),
            failure_mode,
            question_topk: config.pipeline.question_topk,
            chat_topk: config.pipeline.chat_topk,
        }
    }

    /// Assemble a pipeline against the real Gemini and Elasticsearch
    /// endpoints named in the configuration.
    pub fn from_config(config: &AppConfig, failure_mode: FailureMode) -> Result<Self> {
        let genai: Arc<dyn GenerativeClient> = Arc::new(GeminiClient::new(&config.genai)?);
        let search: Arc<dyn SearchClient> = Arc::new(ElasticClient::new(&config.search)?);
        Ok(Self::new(genai, search, config, failure_mode))
    }

    /// Single-shot flow: translate, retrieve, synthesize a rigidly formatted
    /// grounded answer. `topk` falls back to the configured default.
    pub async fn process_question(
        &self,
        question: &str,
        topk: Option<usize>,
    ) -> Result<QuestionResponse> {
        let topk = topk.unwrap_or(self.question_topk);

        let translated_query = self.translator.translate(question, &[]).await;

        let (evidence, raw_hits) = self
            .fetch_evidence(&translated_query, topk)
            .await?;

        tracing::info!(
            question,
            translated_query = %translated_query,
            raw_hits,
            evidence = evidence.len(),
            "Processing question"
        );

        let answer = match self.synthesizer.answer_question(question, &evidence).await {
            Ok(answer) => answer,
            Err(e) if self.failure_mode == FailureMode::Lenient => {
                tracing::error!(error = %e, "Synthesis failed, returning fallback answer");
                FALLBACK_GENERIC.to_string()
            }
            Err(e) => return Err(e),
        };

        Ok(QuestionResponse {
            question: question.to_string(),
            translated_query,
            topk,
            answer,
            evidence_preview: preview(&evidence, EVIDENCE_PREVIEW_LIMIT),
        })
    }

    /// Conversational flow: context window, context-aware translation,
    /// lenient retrieval, persona-framed synthesis, diagnosis analysis.
    /// Never surfaces an upstream error to the caller.
    pub async fn process_chat_message(
        &self,
        user_message: &str,
        history: &[Turn],
        session_id: &str,
    ) -> ChatResponse {
        let conversation_context = context_window::build(history, user_message);

        let translated_query = self.translator.translate(user_message, history).await;

        // Nothing to search for when translation degraded to empty
        let (evidence, raw_hits) = if translated_query.trim().is_empty() {
            (Vec::new(), 0)
        } else {
            self.retriever
                .retrieve_or_empty(&translated_query, self.chat_topk)
                .await
        };

        tracing::info!(
            session_id,
            translated_query = %translated_query,
            raw_hits,
            evidence = evidence.len(),
            "Processing chat message"
        );

        let response = match self
            .synthesizer
            .respond_in_chat(&conversation_context, &evidence, &translated_query)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(session_id, error = %e, "Chat synthesis failed, returning fallback");
                FALLBACK_GENERIC.to_string()
            }
        };

        let mut full_history = history.to_vec();
        full_history.push(Turn::user(user_message));
        let diagnosis_context = diagnosis::analyze(&full_history);

        ChatResponse {
            response,
            diagnosis_context,
            medical_snippets: preview(&evidence, CHAT_SNIPPET_LIMIT),
            symptoms_detected: translated_query,
        }
    }

    async fn fetch_evidence(
        &self,
        translated_query: &str,
        topk: usize,
    ) -> Result<(Vec<RetrievedPassage>, usize)> {
        if translated_query.trim().is_empty() {
            return Ok((Vec::new(), 0));
        }

        match self.failure_mode {
            FailureMode::Strict => self.retriever.retrieve(translated_query, topk).await,
            FailureMode::Lenient => Ok(self
                .retriever
                .retrieve_or_empty(translated_query, topk)
                .await),
        }
    }
}

fn preview(evidence: &[RetrievedPassage], limit: usize) -> Vec<String> {
    evidence
        .iter()
        .take(limit)
        .map(|p| p.body.clone())
        .collect()
}
