//! CLI module for Discern.

mod output;
pub mod preflight;

pub use output::Output;

use clap::Parser;

/// Discern - listen to the gist of a video
///
/// Downloads the audio of a video, transcribes it, summarizes the transcript
/// and speaks (or prints) the summary.
#[derive(Parser, Debug)]
#[command(name = "discern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Video URL to summarize
    pub url: String,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, env = "DISCERN_CONFIG")]
    pub config: Option<String>,

    /// Summary model: a tier (good, best) or a model id
    #[arg(short, long)]
    pub model: Option<String>,
}

impl Cli {
    /// Log filter level for the given verbosity, falling back to `configured`.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_url() {
        let cli = Cli::try_parse_from(["discern", "https://youtu.be/abc123"]).unwrap();
        assert_eq!(cli.url, "https://youtu.be/abc123");
        assert_eq!(cli.log_level("warn"), "warn");
    }

    #[test]
    fn test_positional_count_must_be_one() {
        assert!(Cli::try_parse_from(["discern"]).is_err());
        assert!(Cli::try_parse_from(["discern", "a", "b"]).is_err());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "discern",
            "-vv",
            "--model",
            "best",
            "-c",
            "/tmp/discern.toml",
            "https://youtu.be/abc123",
        ])
        .unwrap();

        assert_eq!(cli.log_level("warn"), "debug");
        assert_eq!(cli.model.as_deref(), Some("best"));
        assert_eq!(cli.config.as_deref(), Some("/tmp/discern.toml"));
    }
}
