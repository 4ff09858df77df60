//! Platform detection and audio playback dispatch.
//!
//! Playback is a lookup from [`Platform`] to a [`PlaybackStrategy`]. Platforms
//! without a registered strategy fall back to telling the user where the file
//! is.

use crate::error::{DiscernError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tracing::debug;

/// Operating system family, as far as playback is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Unknown,
}

impl Platform {
    /// Map an OS identifier to a platform.
    ///
    /// Accepts both kernel names (`Darwin`, `Linux`, `Windows`) and Rust's
    /// `std::env::consts::OS` values, case-insensitively.
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            _ => Platform::Unknown,
        }
    }

    /// The platform this binary runs on.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Canonical display name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

/// What to do to get a file played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Launch a player.
    Run(PlayerCommand),
    /// Ask the user to open the file themselves.
    Instruct(String),
}

/// How one platform plays an audio file.
pub trait PlaybackStrategy: Send + Sync {
    fn action(&self, path: &Path) -> PlaybackAction;
}

/// Play by running `program [leading_args..] <path>`.
pub struct CommandPlayback {
    program: String,
    leading_args: Vec<String>,
}

impl CommandPlayback {
    pub fn new(program: &str, leading_args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            leading_args: leading_args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl PlaybackStrategy for CommandPlayback {
    fn action(&self, path: &Path) -> PlaybackAction {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_os_string());

        PlaybackAction::Run(PlayerCommand {
            program: self.program.clone(),
            args,
        })
    }
}

/// Fallback for platforms without a known player.
pub struct ManualPlayback;

impl PlaybackStrategy for ManualPlayback {
    fn action(&self, path: &Path) -> PlaybackAction {
        PlaybackAction::Instruct(format!(
            "Unsupported operating system, please open the audio file manually ({}).",
            path.display()
        ))
    }
}

/// Platform to strategy lookup.
pub struct PlaybackRegistry {
    strategies: HashMap<Platform, Box<dyn PlaybackStrategy>>,
    fallback: Box<dyn PlaybackStrategy>,
}

impl PlaybackRegistry {
    /// A registry where every platform gets manual instructions.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: Box::new(ManualPlayback),
        }
    }

    /// Register (or replace) the strategy for a platform.
    pub fn register(&mut self, platform: Platform, strategy: Box<dyn PlaybackStrategy>) {
        self.strategies.insert(platform, strategy);
    }

    pub fn strategy_for(&self, platform: Platform) -> &dyn PlaybackStrategy {
        self.strategies
            .get(&platform)
            .map(|s| s.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn action(&self, platform: Platform, path: &Path) -> PlaybackAction {
        self.strategy_for(platform).action(path)
    }
}

impl Default for PlaybackRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Platform::MacOs, Box::new(CommandPlayback::new("afplay", &[])));
        // `start` is a shell builtin; the empty argument is the window title.
        registry.register(
            Platform::Windows,
            Box::new(CommandPlayback::new("cmd", &["/C", "start", ""])),
        );
        registry.register(Platform::Linux, Box::new(CommandPlayback::new("xdg-open", &[])));
        registry
    }
}

/// Runs player commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &PlayerCommand) -> Result<()>;
}

/// Runs commands as child processes and waits for them to exit.
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &PlayerCommand) -> Result<()> {
        debug!("Running {} {:?}", command.program, command.args);

        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DiscernError::ToolNotFound(command.program.clone())
                } else {
                    DiscernError::Playback(format!("{}: {}", command.program, e))
                }
            })?;

        if !status.success() {
            return Err(DiscernError::Playback(format!(
                "{} exited with {}",
                command.program, status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_mapping() {
        assert_eq!(Platform::from_os_name("Darwin").name(), "macOS");
        assert_eq!(Platform::from_os_name("Linux").name(), "Linux");
        assert_eq!(Platform::from_os_name("Windows").name(), "Windows");
        assert_eq!(Platform::from_os_name("macos"), Platform::MacOs);

        for other in ["FreeBSD", "SunOS", "", "Haiku"] {
            assert_eq!(Platform::from_os_name(other), Platform::Unknown);
            assert_eq!(Platform::from_os_name(other).to_string(), "Unknown");
        }
    }

    #[test]
    fn test_default_players() {
        let registry = PlaybackRegistry::default();
        let path = Path::new("transcript_summary.mp3");

        assert_eq!(
            registry.action(Platform::MacOs, path),
            PlaybackAction::Run(PlayerCommand {
                program: "afplay".to_string(),
                args: vec![OsString::from("transcript_summary.mp3")],
            })
        );

        match registry.action(Platform::Windows, path) {
            PlaybackAction::Run(cmd) => {
                assert_eq!(cmd.program, "cmd");
                assert_eq!(cmd.args.last(), Some(&OsString::from("transcript_summary.mp3")));
            }
            other => panic!("unexpected action: {:?}", other),
        }

        match registry.action(Platform::Linux, path) {
            PlaybackAction::Run(cmd) => assert_eq!(cmd.program, "xdg-open"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_platform_gets_instructions() {
        let registry = PlaybackRegistry::default();
        let action = registry.action(Platform::Unknown, Path::new("transcript_summary.mp3"));

        assert_eq!(
            action,
            PlaybackAction::Instruct(
                "Unsupported operating system, please open the audio file manually (transcript_summary.mp3)."
                    .to_string()
            )
        );
    }

    #[test]
    fn test_register_overrides_platform() {
        let mut registry = PlaybackRegistry::default();
        registry.register(Platform::Linux, Box::new(CommandPlayback::new("mpv", &["--no-video"])));

        match registry.action(Platform::Linux, Path::new("a.mp3")) {
            PlaybackAction::Run(cmd) => {
                assert_eq!(cmd.program, "mpv");
                assert_eq!(cmd.args, vec![OsString::from("--no-video"), OsString::from("a.mp3")]);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_player_is_reported() {
        let command = PlayerCommand {
            program: "discern-no-such-player".to_string(),
            args: vec![],
        };
        let result = SystemCommandRunner.run(&command).await;
        assert!(matches!(result, Err(DiscernError::ToolNotFound(_))));
    }
}
