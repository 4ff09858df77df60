//! Summarizer stage and its retry loop.

use super::{ChatBackend, CompletionRequest, ConversationContext};
use crate::cli::Output;
use crate::config::{Prompts, SummarySettings};
use crate::error::{DiscernError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// How the summarizer reacts to failed completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait between attempts.
    pub delay: Duration,
    /// Total attempts before giving up. None keeps trying.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &SummarySettings) -> Self {
        Self {
            delay: settings.retry_delay(),
            max_attempts: settings.max_attempts,
        }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Turns a transcript into a summary.
pub struct Summarizer {
    backend: Arc<dyn ChatBackend>,
    model: String,
    prompts: Prompts,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn ChatBackend>, model: &str, prompts: Prompts) -> Self {
        Self {
            backend,
            model: model.to_string(),
            prompts,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// A fresh conversation opened by the configured system instruction.
    pub fn initial_context(&self) -> ConversationContext {
        ConversationContext::with_system(self.prompts.system_instruction())
    }

    /// Append the wrapped transcript to `context` and ask the model for a summary.
    ///
    /// Transient failures are retried after the policy delay; rejected requests
    /// and an empty `context` fail immediately. Returns the context extended by
    /// the transcript turn and the reply, alongside the summary.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn summarize(
        &self,
        mut context: ConversationContext,
        transcript: &str,
    ) -> Result<(ConversationContext, String)> {
        if context.is_empty() {
            return Err(DiscernError::Summarization(
                "conversation context has no system instruction".to_string(),
            ));
        }

        context.push_user(self.prompts.wrap_transcript(transcript));
        let request = CompletionRequest::for_context(&self.model, &context);

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            match self.backend.complete(&request).await {
                Ok(summary) => {
                    info!(attempts, "Summary received ({} characters)", summary.len());
                    context.push_assistant(summary.clone());
                    return Ok((context, summary));
                }
                Err(e) if !e.is_transient() => {
                    error!(error = %e, "Summary request rejected");
                    return Err(match e {
                        DiscernError::Summarization(_) => e,
                        other => DiscernError::Summarization(other.to_string()),
                    });
                }
                Err(e) if self.retry.exhausted(attempts) => {
                    error!(error = %e, attempts, "Giving up on summary");
                    return Err(DiscernError::Summarization(format!(
                        "giving up after {} attempts: {}",
                        attempts, e
                    )));
                }
                Err(e) => {
                    warn!(error = %e, attempts, "Summary request failed, retrying in {:?}", self.retry.delay);
                    Output::warning(&e.to_string());
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails `failures` times with `error`, then answers.
    struct FlakyBackend {
        failures: u32,
        error: fn() -> DiscernError,
        calls: AtomicU32,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl FlakyBackend {
        fn new(failures: u32, error: fn() -> DiscernError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for FlakyBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok("Summary: hello world".to_string())
            }
        }
    }

    fn transient() -> DiscernError {
        DiscernError::OpenAI("GPT API error: 503 Service Unavailable".to_string())
    }

    fn rejected() -> DiscernError {
        DiscernError::OpenAIRejected("GPT API error: invalid_api_key".to_string())
    }

    fn summarizer(backend: Arc<FlakyBackend>) -> Summarizer {
        Summarizer::new(backend, "gpt-3.5-turbo-16k", Prompts::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        for failures in [0u32, 1, 3] {
            let backend = Arc::new(FlakyBackend::new(failures, transient));
            let summarizer = summarizer(backend.clone());
            let context = summarizer.initial_context();

            let started = Instant::now();
            let (_, summary) = summarizer.summarize(context, "hello world").await.unwrap();

            assert_eq!(summary, "Summary: hello world");
            assert_eq!(backend.calls(), failures + 1);
            assert_eq!(started.elapsed(), Duration::from_secs(5) * failures);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_request_is_not_retried() {
        let backend = Arc::new(FlakyBackend::new(u32::MAX, rejected));
        let summarizer = summarizer(backend.clone());

        let started = Instant::now();
        let result = summarizer
            .summarize(summarizer.initial_context(), "hello world")
            .await;

        assert!(matches!(result, Err(DiscernError::Summarization(_))));
        assert_eq!(backend.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_caps_retries() {
        let backend = Arc::new(FlakyBackend::new(u32::MAX, transient));
        let summarizer = summarizer(backend.clone()).with_retry(RetryPolicy {
            delay: Duration::from_secs(5),
            max_attempts: Some(3),
        });

        let started = Instant::now();
        let result = summarizer
            .summarize(summarizer.initial_context(), "hello world")
            .await;

        assert!(matches!(result, Err(DiscernError::Summarization(_))));
        assert_eq!(backend.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_empty_context_fails_without_calling_backend() {
        let backend = Arc::new(FlakyBackend::new(0, transient));
        let summarizer = summarizer(backend.clone());

        let result = summarizer
            .summarize(ConversationContext::new(), "hello world")
            .await;

        assert!(matches!(result, Err(DiscernError::Summarization(_))));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_wrapped_transcript() {
        let backend = Arc::new(FlakyBackend::new(0, transient));
        let summarizer = summarizer(backend.clone());

        let (context, _) = summarizer
            .summarize(summarizer.initial_context(), "hello world")
            .await
            .unwrap();

        assert_eq!(context.len(), 3);
        assert_eq!(context.messages()[2].role, Role::Assistant);
        assert_eq!(context.messages()[2].content, "Summary: hello world");
        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model, "gpt-3.5-turbo-16k");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.top_p, 1.0);
        assert_eq!(request.frequency_penalty, 0.0);
        assert_eq!(request.presence_penalty, 0.0);
        assert_eq!(request.max_tokens, 4096);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(
            request.messages[1].content,
            "<BEGIN TRANSCRIPTION FROM VIDEO'S AUDIO>hello world<END TRANSCRIPTION FROM VIDEO'S AUDIO>"
        );
    }
}
