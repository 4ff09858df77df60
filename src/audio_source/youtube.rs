//! yt-dlp backed media resolution and download.

use super::{AudioStream, MediaBackend, MediaInfo};
use crate::config::FetcherSettings;
use crate::error::{DiscernError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Media backend that shells out to yt-dlp.
pub struct YtDlpBackend {
    ytdlp_path: String,
    no_check_certificates: bool,
}

impl YtDlpBackend {
    pub fn new() -> Self {
        Self::with_config(&FetcherSettings::default())
    }

    pub fn with_config(settings: &FetcherSettings) -> Self {
        Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            no_check_certificates: settings.no_check_certificates,
        }
    }

    /// Arguments for listing the formats of a single video.
    fn probe_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        if self.no_check_certificates {
            args.push("--no-check-certificates".to_string());
        }
        args.push(url.to_string());
        args
    }

    /// Arguments for downloading one format to an exact path.
    fn download_args(&self, url: &str, format_id: &str, target: &Path) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            format_id.to_string(),
            "--output".to_string(),
            target.to_string_lossy().to_string(),
            "--no-playlist".to_string(),
            "--no-part".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
        ];
        if self.no_check_certificates {
            args.push("--no-check-certificates".to_string());
        }
        args.push(url.to_string());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> DiscernError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DiscernError::ToolNotFound(self.ytdlp_path.clone())
        } else {
            DiscernError::AudioDownload(format!("yt-dlp execution failed: {e}"))
        }
    }
}

impl Default for YtDlpBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// File name stem for a media id, safe on every filesystem.
fn file_stem_for(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        "audio".to_string()
    } else {
        stem
    }
}

/// Parse the `--dump-json` output of yt-dlp.
fn parse_media_info(json: &str) -> Result<MediaInfo> {
    serde_json::from_str(json.trim())
        .map_err(|e| DiscernError::VideoSource(format!("Failed to parse yt-dlp output: {}", e)))
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        debug!("Resolving streams");

        let output = Command::new(&self.ytdlp_path)
            .args(self.probe_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiscernError::VideoSource(format!(
                "yt-dlp error: {}",
                stderr.trim()
            )));
        }

        let info = parse_media_info(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Found {} streams", info.streams.len());
        Ok(info)
    }

    #[instrument(skip(self, media, output_dir), fields(format_id = %stream.format_id))]
    async fn download_stream(
        &self,
        url: &str,
        media: &MediaInfo,
        stream: &AudioStream,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;

        let target = output_dir.join(format!("{}.{}", file_stem_for(&media.id), stream.ext));
        info!("Downloading audio to {}", target.display());

        let output = Command::new(&self.ytdlp_path)
            .args(self.download_args(url, &stream.format_id, &target))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            // --no-part writes straight to the target, so a failed run leaves a partial file.
            if let Err(e) = tokio::fs::remove_file(&target).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial download {}: {}", target.display(), e);
                }
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiscernError::AudioDownload(format!(
                "yt-dlp error: {}",
                stderr.trim()
            )));
        }

        if !target.exists() {
            return Err(DiscernError::AudioDownload(format!(
                "yt-dlp did not produce expected file: {}",
                target.display()
            )));
        }

        Ok(target)
    }
}
