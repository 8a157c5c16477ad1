use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

use crate::Error;
use crate::common::app_config::DEFAULT_OPENAI_MODEL;
use crate::llms::{CompletionRequest, LlmProvider};

/// OpenAI chat-completion client.
pub struct ChatGpt {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatGpt {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)),
            model: model.to_string(),
        }
    }

    /// Builds a client from OPENAI_API_KEY and OPENAI_MODEL.
    /// None when no API key is configured: callers then run without an LLM.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let model = crate::common::env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL);
        Some(Self::new(api_key.trim(), &model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for ChatGpt {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Error> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(request.system.as_str())
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(request.user.as_str())
                    .build()?
                    .into(),
            ])
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()?;

        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            prompt_bytes = request.user.len(),
            "Sending completion request"
        );
        let response = self.client.chat().create(chat_request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(Error::EmptyCompletion)
    }
}
