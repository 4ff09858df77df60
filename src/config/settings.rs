//! Configuration settings for Discern.

use crate::openai::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Build-time default for the output mode: speak the summary (`true`) or
/// print it to stdout (`false`, handy for piping).
pub const SPEAK_SUMMARY: bool = true;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub fetcher: FetcherSettings,
    pub transcription: TranscriptionSettings,
    pub summary: SummarySettings,
    pub output: OutputSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory the downloaded audio is written to.
    pub download_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            download_dir: ".".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. Falls back to the OPENAI_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Skip TLS certificate verification for OpenAI requests only.
    pub accept_invalid_certs: bool,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }
}

/// Audio fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: String,
    /// Container preferred when several audio-only streams exist.
    pub preferred_container: String,
    /// Pass --no-check-certificates to yt-dlp.
    pub no_check_certificates: bool,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            preferred_container: "webm".to_string(),
            no_check_certificates: false,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text model.
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

/// Summary model tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Low cost, 16k context window.
    #[default]
    Good,
    /// Expensive, 128k context window for long videos.
    Best,
}

impl ModelTier {
    /// Chat model backing this tier.
    pub fn model(&self) -> &'static str {
        match self {
            ModelTier::Good => "gpt-3.5-turbo-16k",
            ModelTier::Best => "gpt-4-1106-preview",
        }
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "good" => Ok(ModelTier::Good),
            "best" => Ok(ModelTier::Best),
            _ => Err(format!("Unknown model tier: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::Good => write!(f, "good"),
            ModelTier::Best => write!(f, "best"),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Model tier used when no explicit model is set.
    pub tier: ModelTier,
    /// Explicit chat model, overrides `tier`.
    pub model: Option<String>,
    /// Seconds to wait between attempts after a transient error.
    pub retry_delay_secs: u64,
    /// Give up after this many attempts. None retries until success.
    pub max_attempts: Option<u32>,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            tier: ModelTier::Good,
            model: None,
            retry_delay_secs: 5,
            max_attempts: None,
        }
    }
}

impl SummarySettings {
    /// The chat model to use.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.tier.model().to_string())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Apply a `--model` value: a tier name selects the tier, anything else
    /// is taken as a model id.
    pub fn apply_model_override(&mut self, value: &str) {
        match value.parse::<ModelTier>() {
            Ok(tier) => {
                self.tier = tier;
                self.model = None;
            }
            Err(_) => self.model = Some(value.to_string()),
        }
    }
}

/// Output rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Speak the summary instead of only printing it.
    pub speak: bool,
    /// Where the synthesized summary is written. Never deleted.
    pub speech_file: String,
    /// Text-to-speech voice.
    pub voice: String,
    /// Text-to-speech model.
    pub tts_model: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            speak: SPEAK_SUMMARY,
            speech_file: "transcript_summary.mp3".to_string(),
            voice: "alloy".to_string(),
            tts_model: "tts-1".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(crate::error::DiscernError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("discern")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded download directory path.
    pub fn download_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.download_dir)
    }

    /// Get the expanded speech output path.
    pub fn speech_file(&self) -> PathBuf {
        Self::expand_path(&self.output.speech_file)
    }
}
