//! Discern - listen to the gist of a video
//!
//! Turns a video URL into a short spoken (or printed) summary.
//!
//! # Overview
//!
//! A run goes through four stages, one after another:
//! - fetch the best audio-only stream of the video with yt-dlp
//! - transcribe the audio with a speech-to-text model
//! - summarize the transcript with a chat model, retrying transient failures
//! - speak the summary through a text-to-speech model, or print it
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `audio_source` - Stream selection and audio download
//! - `transcription` - Speech-to-text
//! - `summary` - Conversation context and the summarizer
//! - `render` - Text output, speech synthesis and playback
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use discern::config::Settings;
//! use discern::orchestrator::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!
//!     let report = pipeline
//!         .run("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &mut std::io::stdout())
//!         .await?;
//!     eprintln!("Summarized {} characters of transcript", report.transcript_chars);
//!
//!     Ok(())
//! }
//! ```

pub mod audio_source;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod render;
pub mod summary;
pub mod transcription;

pub use error::{DiscernError, Result};
