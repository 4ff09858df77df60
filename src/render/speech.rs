//! Text-to-speech synthesis.

use crate::error::{DiscernError, Result};
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, Voice};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Trait for speech synthesis services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and write the audio to `output_path`.
    async fn synthesize(&self, text: &str, output_path: &Path) -> Result<()>;
}

/// Synthesizer backed by the OpenAI speech endpoint.
pub struct OpenAISpeech {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAISpeech {
    pub fn new(client: Client<OpenAIConfig>, model: &str, voice: &str) -> Result<Self> {
        Ok(Self {
            client,
            model: parse_model(model)?,
            voice: parse_voice(voice)?,
        })
    }
}

fn parse_model(name: &str) -> Result<SpeechModel> {
    match name.to_lowercase().as_str() {
        "tts-1" => Ok(SpeechModel::Tts1),
        "tts-1-hd" => Ok(SpeechModel::Tts1Hd),
        _ => Err(DiscernError::Config(format!("Unknown speech model: {}", name))),
    }
}

fn parse_voice(name: &str) -> Result<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        _ => Err(DiscernError::Config(format!("Unknown voice: {}", name))),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeech {
    #[instrument(skip(self, text), fields(output = %output_path.display()))]
    async fn synthesize(&self, text: &str, output_path: &Path) -> Result<()> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .build()
            .map_err(|e| DiscernError::Speech(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| DiscernError::Speech(format!("TTS API error: {}", e)))?;

        response
            .save(output_path)
            .await
            .map_err(|e| DiscernError::Speech(format!("Failed to save speech: {}", e)))?;

        debug!("Speech written");
        Ok(())
    }
}
