pub mod chatgpt;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod prompts;

use async_trait::async_trait;
pub use prompts::{format_text_list, prompt_client_fields, prompt_custom, system_prompt};

pub use chatgpt::ChatGpt;

use crate::Error;

/// Low temperature: literal compliance with the line protocol matters more than creativity.
pub const TEMPERATURE: f32 = 0.3;

/// Upper bound on the completion budget, whatever the number of texts.
pub const MAX_TOKENS_CAP: u32 = 16_000;

const BASE_TOKENS: u32 = 256;
const TOKENS_PER_TEXT: u32 = 96;

/// Completion budget sized to the number of texts being rewritten, not to the whole document.
pub fn max_tokens_for(text_count: usize) -> u32 {
    let count = u32::try_from(text_count).unwrap_or(u32::MAX);
    BASE_TOKENS
        .saturating_add(TOKENS_PER_TEXT.saturating_mul(count))
        .min(MAX_TOKENS_CAP)
}

/// Everything a hosted chat-completion API needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// A request with the pipeline's fixed temperature and a budget for `text_count` texts.
    pub fn for_texts(system: String, user: String, text_count: usize) -> Self {
        Self {
            system,
            user,
            temperature: TEMPERATURE,
            max_tokens: max_tokens_for(text_count),
        }
    }
}

/// Interface to a hosted LLM that lets us complete a prompt and await a response.
///
/// Implementations make exactly one attempt: a failure is returned to the caller, who decides
/// what to fall back to.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Error>;
}
