//! Pre-flight checks before expensive operations.
//!
//! Validates that the API key and yt-dlp are available before the pipeline
//! starts downloading anything.

use crate::config::Settings;
use crate::error::{DiscernError, Result};
use crate::openai::resolve_api_key;
use std::process::Command;

/// Run all pre-flight checks for a pipeline run.
pub fn check(settings: &Settings) -> Result<()> {
    check_api_key(settings)?;
    check_tool(&settings.fetcher.ytdlp_path)?;
    Ok(())
}

/// Check that an OpenAI API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match resolve_api_key(&settings.openai) {
        Some(_) => Ok(()),
        None => Err(DiscernError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(DiscernError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DiscernError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(DiscernError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
