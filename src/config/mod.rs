//! Configuration module for Discern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts};
pub use settings::{
    FetcherSettings, GeneralSettings, ModelTier, OpenAISettings, OutputSettings, PromptSettings,
    Settings, SummarySettings, TranscriptionSettings, SPEAK_SUMMARY,
};
