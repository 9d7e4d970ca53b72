//! Grounded answer synthesis
//!
//! Produces the final Vietnamese answer from retrieved English passages,
//! enforcing a citation footer whenever evidence exists. Retry exhaustion
//! degrades to a fixed transient-service apology; the synthesized answer is
//! never the empty string.

use crate::errors::Result;
use crate::genai::GenerativeClient;
use crate::retry::RetryPolicy;
use crate::search::RetrievedPassage;
use std::sync::Arc;

/// Single-shot answer instruction: rigid three-part format with a source
/// footer quoting 1-3 verbatim English sentences
pub const ANSWER_PROMPT: &str = "Bạn là trợ lý y khoa. Từ các trích đoạn tiếng Anh dưới đây, hãy trả lời NGẮN GỌN bằng tiếng Việt, có cảnh báo giới hạn (không thay thế tư vấn bác sĩ). \n\
Yêu cầu:\n\
- Tóm tắt mạch lạc dựa trên snippet (không bịa).\n\
- Nếu câu hỏi là \"triệu chứng của X\", hãy liệt kê bullet ngắn.\n\
- Thêm \"Nguồn (trích sách):\" và dán 1-3 câu tiêu biểu (giữ nguyên tiếng Anh).\n\
Dữ liệu trích:\n";

/// Single-shot instruction when no evidence was retrieved: safety-first
/// guidance, no fabricated citations
const NO_EVIDENCE_PROMPT: &str = "Bạn là trợ lý y khoa. Không tìm thấy trích đoạn nào cho câu hỏi dưới đây. \
Hãy trả lời NGẮN GỌN bằng tiếng Việt theo hướng an toàn, khuyến nghị gặp bác sĩ khi cần, \
và KHÔNG bịa nguồn trích dẫn.\n";

/// Conversational persona and safety preamble
pub const SYSTEM_PROMPT: &str = "Bạn là trợ lý y khoa AI chuyên nghiệp với các nguyên tắc sau:\n\n\
🔍 **PHÂN TÍCH TRIỆU CHỨNG:**\n\
- Đặt câu hỏi chi tiết để hiểu rõ triệu chứng\n\
- Hỏi về thời gian xuất hiện, mức độ nghiêm trọng, yếu tố kích thích\n\
- Thu thập thông tin về tiền sử bệnh, thuốc đang dùng\n\n\
💡 **TƯ VẤN Y KHOA:**\n\
- Đưa ra giải thích dễ hiểu về các tình trạng có thể xảy ra\n\
- Đề xuất các biện pháp chăm sóc ban đầu an toàn\n\
- Phân loại mức độ cấp thiết: tự chăm sóc / khám bác sĩ / cấp cứu\n\n\
⚠️ **AN TOÀN & GIỚI HẠN:**\n\
- LUÔN nhấn mạnh: \"Thông tin chỉ mang tính tham khảo, không thay thế bác sĩ\"\n\
- Khuyến nghị gặp bác sĩ nếu triệu chứng nghiêm trọng hoặc kéo dài\n\
- KHÔNG chẩn đoán chính thức hay kê toa thuốc\n\n\
📝 **PHONG CÁCH GIAO TIẾP:**\n\
- Thân thiện, dễ hiểu, không gây lo lắng\n\
- Sử dụng bullet points cho thông tin rõ ràng\n\
- Hỏi thêm thông tin khi cần thiết\n\n\
Hãy phân tích cuộc hội thoại và đưa ra phản hồi phù hợp.";

/// Citation-footer contract appended to the chat prompt when evidence exists
const CITATION_REQUIREMENT: &str = "**YÊU CẦU BẮT BUỘC:** \n\
- Sử dụng thông tin y khoa trên để trả lời chính xác\n\
- PHẢI bao gồm phần \"**Nguồn (trích sách):**\" ở cuối\n\
- Trích dẫn 1-2 câu tiêu biểu từ nguồn (giữ nguyên tiếng Anh trong dấu ngoặc kép)\n\
- Format chính xác: **Nguồn (trích sách):** \"exact English quote from medical source\"\n";

/// Transient-service apology returned after retry exhaustion
pub const FALLBACK_RATE_LIMITED: &str =
    "Xin lỗi, tôi đang gặp sự cố kết nối. Vui lòng thử lại sau ít phút.";

/// Generic apology used when the service produced nothing usable
pub const FALLBACK_GENERIC: &str =
    "Đã xảy ra lỗi khi xử lý tin nhắn của bạn. Vui lòng thử lại.";

/// Passages inlined into the chat prompt's medical-context block
const CHAT_EVIDENCE_LIMIT: usize = 3;

pub struct Synthesizer {
    client: Arc<dyn GenerativeClient>,
    retry: RetryPolicy,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn GenerativeClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Answer a single-shot question from the retrieved evidence.
    ///
    /// `Ok` values are never empty; retry exhaustion yields the fixed
    /// apology. Fatal upstream errors propagate for the caller to decide.
    pub async fn answer_question(
        &self,
        question: &str,
        evidence: &[RetrievedPassage],
    ) -> Result<String> {
        let prompt = build_question_prompt(question, evidence);
        self.generate_or_fallback(&prompt).await
    }

    /// Generate a conversational reply grounded in the evidence set.
    /// The citation-footer requirement is present iff evidence is non-empty.
    pub async fn respond_in_chat(
        &self,
        conversation_context: &str,
        evidence: &[RetrievedPassage],
        translated_query: &str,
    ) -> Result<String> {
        let prompt = build_chat_prompt(conversation_context, evidence, translated_query);
        self.generate_or_fallback(&prompt).await
    }

    async fn generate_or_fallback(&self, prompt: &str) -> Result<String> {
        let outcome = self
            .retry
            .run(|| async { self.client.generate(prompt).await })
            .await?;

        Ok(match outcome {
            Some(text) => {
                let answer = text.trim().to_string();
                if answer.is_empty() {
                    tracing::warn!("Generative service returned a blank answer");
                    FALLBACK_GENERIC.to_string()
                } else {
                    answer
                }
            }
            None => FALLBACK_RATE_LIMITED.to_string(),
        })
    }
}

/// Build the single-shot instruction. With evidence, the rigid three-part
/// format applies; without it, the citation requirement is omitted entirely.
fn build_question_prompt(question: &str, evidence: &[RetrievedPassage]) -> String {
    if evidence.is_empty() {
        return format!("Câu hỏi (VI): {}\n\n{}", question, NO_EVIDENCE_PROMPT);
    }

    let joined = evidence
        .iter()
        .map(|p| format!("\n- {}", p.body))
        .collect::<String>();

    format!("Câu hỏi (VI): {}\n\n{}{}", question, ANSWER_PROMPT, joined)
}

/// Build the conversational instruction: persona, context, and (only when
/// evidence exists) the medical-context block plus the citation contract.
fn build_chat_prompt(
    conversation_context: &str,
    evidence: &[RetrievedPassage],
    translated_query: &str,
) -> String {
    let mut prompt = format!("{}\n\n{}\n\n", SYSTEM_PROMPT, conversation_context);

    if !evidence.is_empty() {
        let medical_context = evidence
            .iter()
            .take(CHAT_EVIDENCE_LIMIT)
            .map(|p| p.body.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        prompt.push_str(&format!(
            "\nTHÔNG TIN Y KHOA LIÊN QUAN (từ tìm kiếm: \"{}\"):\n{}\n\n{}\n",
            translated_query, medical_context, CITATION_REQUIREMENT
        ));
    }

    prompt.push_str("\nTrợ lý AI:");
    prompt
}
