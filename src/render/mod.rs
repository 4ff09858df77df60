//! Presenting the summary: printed text, or synthesized speech plus playback.

mod playback;
mod speech;

pub use playback::{
    CommandPlayback, CommandRunner, ManualPlayback, PlaybackAction, PlaybackRegistry,
    PlaybackStrategy, Platform, PlayerCommand, SystemCommandRunner,
};
pub use speech::{OpenAISpeech, SpeechSynthesizer};

use crate::cli::Output;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything needed to speak a summary aloud.
pub struct SpeechOutput {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub speech_path: PathBuf,
    pub playback: PlaybackRegistry,
    pub runner: Arc<dyn CommandRunner>,
    pub platform: Platform,
}

impl SpeechOutput {
    /// Speech output for the current platform with the default players.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, speech_path: PathBuf) -> Self {
        Self {
            synthesizer,
            speech_path,
            playback: PlaybackRegistry::default(),
            runner: Arc::new(SystemCommandRunner),
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }
}

enum RenderMode {
    Text,
    Speech(SpeechOutput),
}

/// Final pipeline stage.
///
/// Rendering never fails the run: the summary already exists, so synthesis
/// and playback problems are reported and swallowed.
pub struct Renderer {
    mode: RenderMode,
}

impl Renderer {
    /// Print the summary only.
    pub fn text() -> Self {
        Self {
            mode: RenderMode::Text,
        }
    }

    /// Speak the summary, then print it.
    pub fn speech(output: SpeechOutput) -> Self {
        Self {
            mode: RenderMode::Speech(output),
        }
    }

    /// Where synthesized speech is written, if speaking.
    pub fn speech_path(&self) -> Option<&Path> {
        match &self.mode {
            RenderMode::Text => None,
            RenderMode::Speech(speech) => Some(&speech.speech_path),
        }
    }

    pub async fn render<W: Write + Send>(&self, summary: &str, out: &mut W) {
        match &self.mode {
            RenderMode::Text => write_line(out, summary),
            RenderMode::Speech(speech) => Self::speak(speech, summary, out).await,
        }
    }

    async fn speak<W: Write + Send>(speech: &SpeechOutput, summary: &str, out: &mut W) {
        if let Err(e) = speech
            .synthesizer
            .synthesize(summary, &speech.speech_path)
            .await
        {
            error!(error = %e, "Speech synthesis failed");
            Output::error(&e.to_string());
            write_line(out, summary);
            return;
        }

        info!("Speech saved to {}", speech.speech_path.display());
        write_line(out, &format!("\n\t{}\n", summary));

        match speech.playback.action(speech.platform, &speech.speech_path) {
            PlaybackAction::Run(command) => {
                if let Err(e) = speech.runner.run(&command).await {
                    error!(error = %e, platform = %speech.platform, "Playback failed");
                    Output::error(&e.to_string());
                }
            }
            PlaybackAction::Instruct(message) => write_line(out, &message),
        }
    }
}

fn write_line<W: Write>(out: &mut W, text: &str) {
    if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
        warn!(error = %e, "Failed to write summary");
    }
}
