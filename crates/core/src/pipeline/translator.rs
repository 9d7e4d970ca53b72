//! Query translation
//!
//! Converts a Vietnamese medical question into an English search query,
//! using a short trailing context window to disambiguate terms. Failure is
//! never surfaced to the caller: the translated query degrades to an empty
//! string, which downstream stages treat as "nothing to search".

use crate::genai::GenerativeClient;
use crate::pipeline::context_window::Turn;
use crate::retry::RetryPolicy;
use std::sync::Arc;

/// Translation instruction: bilingual medical expert, terse output contract
pub const TRANSLATE_PROMPT: &str = "Bạn là chuyên gia y khoa song ngữ. \n\
Nhiệm vụ: dịch câu hỏi y khoa tiếng Việt dưới đây sang tiếng Anh NGẮN GỌN, đúng thuật ngữ.\n\
CHỈ trả ra câu tiếng Anh, không thêm gì khác.\n\
Câu hỏi:\n";

/// Turns of trailing context appended to the translation instruction
const TRANSLATE_CONTEXT_TURNS: usize = 3;

pub struct Translator {
    client: Arc<dyn GenerativeClient>,
    retry: RetryPolicy,
}

impl Translator {
    pub fn new(client: Arc<dyn GenerativeClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Translate `utterance` to an English query, or `""` on persistent
    /// failure. The output is the trimmed raw service response; the service
    /// is trusted to return only the translated phrase.
    pub async fn translate(&self, utterance: &str, history: &[Turn]) -> String {
        let prompt = self.build_prompt(utterance, history);

        let outcome = self
            .retry
            .run(|| async { self.client.generate(&prompt).await })
            .await;

        match outcome {
            Ok(Some(text)) => {
                let translated = text.trim().to_string();
                tracing::debug!(
                    input = utterance,
                    output = %translated,
                    "Translated query"
                );
                translated
            }
            Ok(None) => {
                tracing::warn!(input = utterance, "Translation unavailable, degrading to empty query");
                String::new()
            }
            Err(e) => {
                tracing::warn!(input = utterance, error = %e, "Translation failed, degrading to empty query");
                String::new()
            }
        }
    }

    fn build_prompt(&self, utterance: &str, history: &[Turn]) -> String {
        let start = history.len().saturating_sub(TRANSLATE_CONTEXT_TURNS);
        let mut context_text = history[start..]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if !context_text.is_empty() {
            context_text.push(' ');
        }
        context_text.push_str(utterance);

        format!("{}{}", TRANSLATE_PROMPT, context_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::genai::MockGenerativeClient;

    #[tokio::test]
    async fn test_translate_success() {
        let client = Arc::new(MockGenerativeClient::fixed("  headache symptoms  "));
        let translator = Translator::new(client.clone(), RetryPolicy::default());

        let out = translator.translate("đau đầu là gì?", &[]).await;
        assert_eq!(out, "headache symptoms");
        assert!(client.prompts()[0].starts_with(TRANSLATE_PROMPT));
        assert!(client.prompts()[0].ends_with("đau đầu là gì?"));
    }

    #[tokio::test]
    async fn test_prompt_carries_trailing_context() {
        let client = Arc::new(MockGenerativeClient::fixed("migraine"));
        let translator = Translator::new(client.clone(), RetryPolicy::default());

        let history = vec![
            Turn::user("một"),
            Turn::assistant("hai"),
            Turn::user("ba"),
            Turn::assistant("bốn"),
        ];
        translator.translate("đau nửa đầu", &history).await;

        let prompt = &client.prompts()[0];
        // Only the last three turns make it into the context
        assert!(!prompt.contains("một"));
        assert!(prompt.contains("hai ba bốn đau nửa đầu"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_degrades_to_empty() {
        let client = Arc::new(MockGenerativeClient::always_rate_limited());
        let translator = Translator::new(client.clone(), RetryPolicy::default());

        let out = translator.translate("đau đầu", &[]).await;
        assert_eq!(out, "");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_degrades_to_empty() {
        let client = Arc::new(MockGenerativeClient::scripted(vec![Err(
            AppError::Generation {
                message: "model not found".into(),
            },
        )]));
        let translator = Translator::new(client.clone(), RetryPolicy::default());

        let out = translator.translate("đau đầu", &[]).await;
        assert_eq!(out, "");
        assert_eq!(client.call_count(), 1);
    }
}
