//! CLI output formatting utilities.
//!
//! Everything here goes to stderr. Stdout is reserved for the summary.

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::OnceLock;

/// Output helper for CLI formatting.
pub struct Output;

/// Spinners are registered here so messages can be printed without tearing them.
fn progress() -> &'static MultiProgress {
    static PROGRESS: OnceLock<MultiProgress> = OnceLock::new();
    PROGRESS.get_or_init(MultiProgress::new)
}

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        Self::print(format!("{} {}", style(">>").cyan().bold(), msg));
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        Self::print(format!("{} {}", style(">>").yellow().bold(), msg));
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        Self::print(format!("{} {}", style(">>").red().bold(), msg));
    }

    fn print(line: String) {
        progress().suspend(|| eprintln!("{}", line));
    }

    /// Create a spinner. Hidden when stderr is not a terminal.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = progress().add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_while_spinner_ticks() {
        let spinner = Output::spinner("Summarizing...");
        Output::warning("GPT API error: 503 Service Unavailable");
        Output::error("TTS API error: 500");
        assert!(!spinner.is_finished());

        spinner.finish_and_clear();
        assert!(spinner.is_finished());
        Output::info("Analyzing video...");
    }
}
