use crate::services::{ChatMessage, ChatRequest};

/// Sampling temperature; low for near-deterministic summaries.
pub(crate) const TEMPERATURE: f32 = 0.1;
pub(crate) const TOP_P: f32 = 0.9;

pub(crate) const SYSTEM_PROMPT: &str = "You write natural, human-sounding summaries of documents.\n\
Rules:\n\
- Do not apologize.\n\
- Do not mention binary data, encoding, PDF structure, or raw bytes.\n\
- Do not say the document is corrupted or unreadable.\n\
- Do not use markdown, bullet symbols, or asterisks (*, -, •, etc.).\n\
- Write plain text only, with numbered points and short paragraphs.\n\
If you truly cannot see any meaningful text at all, keep the answer very short.";

/// Build the user turn carrying the task and the document body.
pub(crate) fn build_user_prompt(document: &str) -> String {
    let mut prompt = String::from(
        "Summarize the following document clearly and concisely.\n\
Include:\n\
1. Main topics and key points\n\
2. Important facts, figures, and conclusions\n\
3. Actionable insights or recommendations\n\
4. Any critical deadlines or dates mentioned\n\n\
Document content:\n",
    );
    prompt.push_str(document);
    prompt.push('\n');
    prompt
}

/// Assemble the chat request with the fixed behavioral policy in the system turn.
pub(crate) fn build_request(model_id: &str, document: &str, max_tokens: u32) -> ChatRequest {
    ChatRequest {
        model: model_id.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(document)),
        ],
        max_tokens,
        temperature: TEMPERATURE,
        top_p: TOP_P,
    }
}
