//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::error::{DiscernError, Result};
use crate::openai::classify_error;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber using the given client and model.
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

/// Name sent with the upload; the service infers the format from its extension.
fn upload_name(audio_path: &Path) -> String {
    audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.mp3")
        .to_string()
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let file_bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            DiscernError::Transcription(format!("Cannot read {}: {}", audio_path.display(), e))
        })?;
        debug!("Uploading {} bytes", file_bytes.len());

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(upload_name(audio_path), file_bytes))
            .model(&self.model)
            .build()
            .map_err(|e| DiscernError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| classify_error("Whisper API", e))?;

        debug!("Transcribed {} characters", response.text.len());
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAISettings;
    use crate::openai::create_client;

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name(Path::new("/tmp/abc.webm")), "abc.webm");
        assert_eq!(upload_name(Path::new("/")), "audio.mp3");
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_any_request() {
        let client = create_client("sk-test", &OpenAISettings::default()).unwrap();
        let transcriber = WhisperTranscriber::new(client, "whisper-1");

        let result = transcriber
            .transcribe(Path::new("/definitely/not/here.webm"))
            .await;

        assert!(matches!(result, Err(DiscernError::Transcription(_))));
    }
}
