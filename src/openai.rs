//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{DiscernError, Result};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;
use tracing::warn;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Error types reported by the API for requests that will never succeed as sent.
const REJECTED_ERROR_TYPES: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "insufficient_quota",
];

/// Create an OpenAI client for the given API key and settings.
///
/// Certificate verification stays on unless `accept_invalid_certs` is set,
/// and then only for this client's HTTP connection pool.
pub fn create_client(api_key: &str, settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs));

    if settings.accept_invalid_certs {
        warn!("TLS certificate verification is disabled for OpenAI requests");
        builder = builder.danger_accept_invalid_certs(true);
    }

    let http_client = builder.build()?;
    let config = OpenAIConfig::new().with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Resolve the API key from settings, falling back to `OPENAI_API_KEY`.
pub fn resolve_api_key(settings: &OpenAISettings) -> Option<String> {
    settings
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
}

/// Convert an async-openai error into a Discern error, tagging it with the
/// name of the service that failed.
pub fn classify_error(service: &str, err: OpenAIError) -> DiscernError {
    let rejected = match &err {
        OpenAIError::ApiError(api) => api
            .r#type
            .as_deref()
            .is_some_and(|t| REJECTED_ERROR_TYPES.contains(&t)),
        OpenAIError::InvalidArgument(_) => true,
        _ => false,
    };

    if rejected {
        DiscernError::OpenAIRejected(format!("{} error: {}", service, err))
    } else {
        DiscernError::OpenAI(format!("{} error: {}", service, err))
    }
}
