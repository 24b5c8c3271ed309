// Summarization prompt
use super::LlmRequest;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that summarizes news articles.";

/// Build the chat request asking for a `word_limit`-word summary of `article_text`.
pub fn summarization_request(article_text: &str, word_limit: u32) -> LlmRequest {
    LlmRequest {
        system: Some(SYSTEM_INSTRUCTION.to_string()),
        prompt: format!(
            "Summarize the following news article in {} words: {}",
            word_limit, article_text
        ),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    }
}
