//! Transcript summarization with a chat-completion model.

mod chat;
pub mod context;
mod summarizer;

pub use chat::OpenAIChat;
pub use context::{ChatMessage, ConversationContext, Role};
pub use summarizer::{RetryPolicy, Summarizer};

use crate::error::Result;
use async_trait::async_trait;

/// Sampling temperature for summaries.
pub const TEMPERATURE: f32 = 0.7;
/// Nucleus sampling mass.
pub const TOP_P: f32 = 1.0;
/// Upper bound on the summary length in tokens.
pub const MAX_TOKENS: u32 = 4096;

/// A fully specified chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// A request for `context` with the fixed summary sampling parameters.
    pub fn for_context(model: &str, context: &ConversationContext) -> Self {
        Self {
            model: model.to_string(),
            messages: context.messages().to_vec(),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// Trait for chat-completion services.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
