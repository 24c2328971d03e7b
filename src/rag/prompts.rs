//! Prompt templates for thread QA

use crate::llm::ChatMessage;
use crate::llm::CompletionRequest;

/// Fixed system instruction for every completion request
pub const SYSTEM_INSTRUCTION: &str = "You are a robust Q&A assistant for noisy Reddit threads.";

/// User turn combining the thread context and the question
#[must_use]
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!("Thread:\n{context}\n\nQuestion: {question}\nAnswer:")
}

/// Full completion request: system instruction, then the user prompt
#[must_use]
pub fn build_request(
    context: &str,
    question: &str,
    temperature: f32,
    max_tokens: usize,
) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(build_user_prompt(context, question)),
        ],
        temperature,
        max_tokens,
    }
}
