//! Pipeline orchestrator for Discern.
//!
//! Runs the four stages strictly in order: fetch the audio, transcribe it,
//! summarize the transcript, render the summary.

use crate::audio_source::{AudioFetcher, Fetcher, YtDlpBackend};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::{DiscernError, Result};
use crate::openai::{create_client, resolve_api_key};
use crate::render::{OpenAISpeech, Renderer, SpeechOutput};
use crate::summary::{OpenAIChat, RetryPolicy, Summarizer};
use crate::transcription::{Transcriber, WhisperTranscriber};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Fetching,
    Transcribing,
    Summarizing,
    Rendering,
    Done,
    Aborted,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub transcript_chars: usize,
    pub summary: String,
}

/// The video summarization pipeline.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Summarizer,
    renderer: Renderer,
    download_dir: PathBuf,
}

impl Pipeline {
    /// Build the production pipeline from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = resolve_api_key(&settings.openai).ok_or_else(|| {
            DiscernError::Config(
                "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
            )
        })?;
        let client = create_client(&api_key, &settings.openai)?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(AudioFetcher::new(
            YtDlpBackend::with_config(&settings.fetcher),
            settings.fetcher.preferred_container.clone(),
        ));

        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
            client.clone(),
            &settings.transcription.model,
        ));

        let model = settings.summary.resolved_model();
        info!("Summarizing with {}", model);
        let summarizer = Summarizer::new(Arc::new(OpenAIChat::new(client.clone())), &model, prompts)
            .with_retry(RetryPolicy::from_settings(&settings.summary));

        let renderer = if settings.output.speak {
            let speech = OpenAISpeech::new(client, &settings.output.tts_model, &settings.output.voice)?;
            Renderer::speech(SpeechOutput::new(Arc::new(speech), settings.speech_file()))
        } else {
            Renderer::text()
        };

        Ok(Self::with_components(
            fetcher,
            transcriber,
            summarizer,
            renderer,
            settings.download_dir(),
        ))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        fetcher: Arc<dyn Fetcher>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Summarizer,
        renderer: Renderer,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            summarizer,
            renderer,
            download_dir,
        }
    }

    /// Summarize the video at `url`, writing the rendered summary to `out`.
    #[instrument(skip(self, out), fields(url = %url))]
    pub async fn run<W: Write + Send>(&self, url: &str, out: &mut W) -> Result<PipelineReport> {
        let mut state = PipelineState::Fetching;
        debug!("Pipeline state: {:?}", state);

        match self.execute(url, out, &mut state).await {
            Ok(report) => {
                advance(&mut state, PipelineState::Done);
                Ok(report)
            }
            Err(e) => {
                warn!("Pipeline aborted while {:?}", state);
                advance(&mut state, PipelineState::Aborted);
                Err(e)
            }
        }
    }

    async fn execute<W: Write + Send>(
        &self,
        url: &str,
        out: &mut W,
        state: &mut PipelineState,
    ) -> Result<PipelineReport> {
        let spinner = Output::spinner("Downloading audio...");
        let fetched = self.fetcher.fetch(url, &self.download_dir).await;
        spinner.finish_and_clear();
        let audio_path = fetched?;
        info!("Audio saved to {}", audio_path.display());

        advance(state, PipelineState::Transcribing);
        let spinner = Output::spinner("Transcribing...");
        let transcribed = self.transcriber.transcribe(&audio_path).await;
        spinner.finish_and_clear();
        self.cleanup_audio(&audio_path);
        let transcript = transcribed?;
        if transcript.trim().is_empty() {
            return Err(DiscernError::Transcription(
                "Whisper API returned an empty transcript".to_string(),
            ));
        }
        info!("Transcription complete ({} characters)", transcript.len());

        advance(state, PipelineState::Summarizing);
        let spinner = Output::spinner("Summarizing...");
        let summarized = self
            .summarizer
            .summarize(self.summarizer.initial_context(), &transcript)
            .await;
        spinner.finish_and_clear();
        let (context, summary) = summarized?;
        debug!("Conversation has {} messages", context.len());

        advance(state, PipelineState::Rendering);
        self.renderer.render(&summary, out).await;

        Ok(PipelineReport {
            transcript_chars: transcript.chars().count(),
            summary,
        })
    }

    /// Remove the downloaded audio unless it is also the speech output file.
    fn cleanup_audio(&self, audio_path: &Path) {
        if let Some(speech_path) = self.renderer.speech_path() {
            if is_same_location(audio_path, speech_path) {
                warn!(
                    "Audio file {} is also the speech output path, keeping it",
                    audio_path.display()
                );
                return;
            }
        }

        match std::fs::remove_file(audio_path) {
            Ok(()) => debug!("Removed {}", audio_path.display()),
            Err(e) => warn!("Failed to cleanup audio file: {}", e),
        }
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!("Pipeline state: {:?} -> {:?}", state, next);
    *state = next;
}

/// Compare two paths by canonical parent directory and file name, so the
/// check works before either file exists.
pub fn is_same_location(a: &Path, b: &Path) -> bool {
    fn normalize(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        Some(parent.canonicalize().ok()?.join(name))
    }

    match (normalize(a), normalize(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}
