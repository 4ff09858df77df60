//! Error types for Discern.

use thiserror::Error;

/// Library-level error type for Discern operations.
#[derive(Error, Debug)]
pub enum DiscernError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Media source error: {0}")]
    VideoSource(String),

    #[error("No audio stream available for {0}")]
    NoAudioStream(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("OpenAI API rejected the request: {0}")]
    OpenAIRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DiscernError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Only remote-service and transport failures qualify. A request the
    /// service rejected outright (bad key, unknown model) will fail the same
    /// way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscernError::OpenAI(_) | DiscernError::Http(_) | DiscernError::Io(_)
        )
    }
}

/// Result type alias for Discern operations.
pub type Result<T> = std::result::Result<T, DiscernError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DiscernError::OpenAI("rate limited".into()).is_transient());
        assert!(!DiscernError::OpenAIRejected("invalid_api_key".into()).is_transient());
        assert!(!DiscernError::Summarization("empty context".into()).is_transient());
        assert!(!DiscernError::Config("missing key".into()).is_transient());
    }
}
