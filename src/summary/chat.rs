//! OpenAI chat-completion backend.

use super::{ChatBackend, ChatMessage, CompletionRequest, Role};
use crate::error::{DiscernError, Result};
use crate::openai::classify_error;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat backend calling the OpenAI chat completions API.
pub struct OpenAIChat {
    client: Client<OpenAIConfig>,
}

impl OpenAIChat {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: std::result::Result<ChatCompletionRequestMessage, OpenAIError> = match message.role
    {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
    };

    built.map_err(|e| DiscernError::Summarization(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl ChatBackend for OpenAIChat {
    #[instrument(skip_all, fields(model = %request.model, messages = request.messages.len()))]
    #[allow(deprecated)]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .top_p(request.top_p)
            .frequency_penalty(request.frequency_penalty)
            .presence_penalty(request.presence_penalty)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| DiscernError::Summarization(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| classify_error("GPT API", e))?;

        debug!("Completion finished with {} choices", response.choices.len());

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| DiscernError::Summarization("GPT API returned an empty response".to_string()))
    }
}
