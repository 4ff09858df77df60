//! Audio source abstraction for Discern.
//!
//! Resolves the audio-only streams a video offers, picks one and downloads it.
//! The actual extraction is delegated to a [`MediaBackend`] (yt-dlp in
//! production).

mod youtube;

pub use youtube::YtDlpBackend;

use crate::error::{DiscernError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};
use url::Url;

/// One downloadable encoding of a video, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    /// Backend-specific format identifier.
    pub format_id: String,
    /// Container / file extension (webm, m4a, mp4, ...).
    #[serde(default)]
    pub ext: String,
    /// Audio codec, `none` when the stream carries no audio.
    #[serde(default)]
    pub acodec: Option<String>,
    /// Video codec, `none` when the stream carries no video.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbit/s.
    #[serde(default)]
    pub abr: Option<f64>,
    /// Size in bytes, when known up front.
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl AudioStream {
    /// True when the stream has an audio track and no video track.
    pub fn is_audio_only(&self) -> bool {
        let has_audio = self.acodec.as_deref().is_some_and(|c| c != "none");
        let has_video = self.vcodec.as_deref().is_some_and(|c| c != "none");
        has_audio && !has_video
    }
}

/// What the backend knows about a video before downloading it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Identifier used to name the downloaded file.
    pub id: String,
    /// Title, if available.
    #[serde(default)]
    pub title: Option<String>,
    /// All encodings on offer.
    #[serde(default, rename = "formats")]
    pub streams: Vec<AudioStream>,
}

/// Pick the stream to download.
///
/// The first audio-only stream in the preferred container wins; otherwise the
/// first audio-only stream of any container. `None` if there is no audio-only
/// stream at all.
pub fn select_audio_stream<'a>(
    streams: &'a [AudioStream],
    preferred_container: &str,
) -> Option<&'a AudioStream> {
    streams
        .iter()
        .filter(|s| s.is_audio_only())
        .find(|s| s.ext.eq_ignore_ascii_case(preferred_container))
        .or_else(|| streams.iter().find(|s| s.is_audio_only()))
}

/// Validate that input is an http(s) URL.
///
/// Input without a scheme (`www.youtube.com/watch?v=...`) is read as https.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let parsed = match Url::parse(trimmed) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", trimmed)),
        other => other,
    }
    .map_err(|_| DiscernError::InvalidInput(format!("Invalid URL format: {}", input)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DiscernError::InvalidInput(
            "URL must use HTTP or HTTPS protocol".to_string(),
        ));
    }

    Ok(parsed)
}

/// Backend that can enumerate and download media streams.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Resolve the streams available for a URL.
    async fn probe(&self, url: &str) -> Result<MediaInfo>;

    /// Download one stream into `output_dir`, returning the written file.
    async fn download_stream(
        &self,
        url: &str,
        media: &MediaInfo,
        stream: &AudioStream,
        output_dir: &Path,
    ) -> Result<PathBuf>;
}

/// The first pipeline stage: turn a video URL into a local audio file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download the audio of `url` into `output_dir`.
    async fn fetch(&self, url: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Fetcher that resolves streams through a [`MediaBackend`] and applies the
/// container preference.
pub struct AudioFetcher<B: MediaBackend> {
    backend: B,
    preferred_container: String,
}

impl<B: MediaBackend> AudioFetcher<B> {
    pub fn new(backend: B, preferred_container: impl Into<String>) -> Self {
        Self {
            backend,
            preferred_container: preferred_container.into(),
        }
    }
}

#[async_trait]
impl<B: MediaBackend> Fetcher for AudioFetcher<B> {
    #[instrument(skip(self, output_dir), fields(url = %url))]
    async fn fetch(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        let parsed = validate_url(url)?;
        let url = parsed.as_str();

        let media = self
            .backend
            .probe(url)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to resolve streams"))?;

        if let Some(title) = &media.title {
            info!("Resolved '{}' ({} streams)", title, media.streams.len());
        }

        let stream = select_audio_stream(&media.streams, &self.preferred_container)
            .ok_or_else(|| DiscernError::NoAudioStream(url.to_string()))
            .inspect_err(|e| error!(error = %e, "No audio-only stream"))?;

        info!(
            format_id = %stream.format_id,
            ext = %stream.ext,
            "Selected audio stream"
        );

        self.backend
            .download_stream(url, &media, stream, output_dir)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to download audio"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    fn stream(id: &str, ext: &str, acodec: &str, vcodec: &str) -> AudioStream {
        AudioStream {
            format_id: id.to_string(),
            ext: ext.to_string(),
            acodec: Some(acodec.to_string()),
            vcodec: Some(vcodec.to_string()),
            abr: None,
            filesize: None,
        }
    }

    struct MockBackend {
        streams: Vec<AudioStream>,
        downloads: AtomicUsize,
        resolved_urls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn new(streams: Vec<AudioStream>) -> Self {
            Self {
                streams,
                downloads: AtomicUsize::new(0),
                resolved_urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaBackend for MockBackend {
        async fn probe(&self, url: &str) -> Result<MediaInfo> {
            self.resolved_urls.lock().unwrap().push(url.to_string());
            Ok(MediaInfo {
                id: "abc123".to_string(),
                title: Some("A video".to_string()),
                streams: self.streams.clone(),
            })
        }

        async fn download_stream(
            &self,
            _url: &str,
            media: &MediaInfo,
            stream: &AudioStream,
            output_dir: &Path,
        ) -> Result<PathBuf> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let path = output_dir.join(format!("{}.{}", media.id, stream.ext));
            std::fs::write(&path, b"audio")?;
            Ok(path)
        }
    }

    #[test]
    fn test_audio_only_detection() {
        assert!(stream("251", "webm", "opus", "none").is_audio_only());
        assert!(!stream("18", "mp4", "mp4a.40.2", "avc1").is_audio_only());
        assert!(!stream("sb0", "mhtml", "none", "none").is_audio_only());

        let mut no_vcodec = stream("140", "m4a", "mp4a.40.2", "none");
        no_vcodec.vcodec = None;
        assert!(no_vcodec.is_audio_only());
    }

    #[test]
    fn test_prefers_container() {
        let streams = vec![
            stream("18", "mp4", "mp4a.40.2", "avc1"),
            stream("140", "m4a", "mp4a.40.2", "none"),
            stream("249", "webm", "opus", "none"),
            stream("251", "webm", "opus", "none"),
        ];
        let selected = select_audio_stream(&streams, "webm").unwrap();
        assert_eq!(selected.format_id, "249");
    }

    #[test]
    fn test_falls_back_to_first_audio_only() {
        let streams = vec![
            stream("18", "mp4", "mp4a.40.2", "avc1"),
            stream("139", "m4a", "mp4a.40.5", "none"),
            stream("140", "m4a", "mp4a.40.2", "none"),
        ];
        let selected = select_audio_stream(&streams, "webm").unwrap();
        assert_eq!(selected.format_id, "139");
    }

    #[test]
    fn test_no_audio_only_stream() {
        let streams = vec![stream("18", "mp4", "mp4a.40.2", "avc1")];
        assert!(select_audio_stream(&streams, "webm").is_none());
        assert!(select_audio_stream(&[], "webm").is_none());
    }

    #[test]
    fn test_validate_url() {
        assert_ok!(validate_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert_ok!(validate_url("http://example.com/video"));
        assert_err!(validate_url("ftp://example.com/video"));
        assert_err!(validate_url("not a url"));
        assert_err!(validate_url(""));
    }

    #[test]
    fn test_validate_url_without_scheme() {
        let url = validate_url("www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");

        let url = validate_url("  youtu.be/dQw4w9WgXcQ ").unwrap();
        assert_eq!(url.host_str(), Some("youtu.be"));
    }

    #[tokio::test]
    async fn test_fetch_downloads_selected_stream() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = AudioFetcher::new(
            MockBackend::new(vec![
                stream("140", "m4a", "mp4a.40.2", "none"),
                stream("251", "webm", "opus", "none"),
            ]),
            "webm",
        );

        let path = fetcher
            .fetch("https://youtube.com/watch?v=abc123", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("abc123.webm"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_fetch_normalizes_schemeless_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = AudioFetcher::new(
            MockBackend::new(vec![stream("251", "webm", "opus", "none")]),
            "webm",
        );

        assert_ok!(
            fetcher
                .fetch("www.youtube.com/watch?v=abc123", dir.path())
                .await
        );
        assert_eq!(
            *fetcher.backend.resolved_urls.lock().unwrap(),
            vec!["https://www.youtube.com/watch?v=abc123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_without_audio_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = AudioFetcher::new(
            MockBackend::new(vec![stream("18", "mp4", "mp4a.40.2", "avc1")]),
            "webm",
        );

        let result = fetcher
            .fetch("https://youtube.com/watch?v=abc123", dir.path())
            .await;

        assert!(matches!(result, Err(DiscernError::NoAudioStream(_))));
        assert_eq!(fetcher.backend.downloads.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = AudioFetcher::new(MockBackend::new(vec![]), "webm");

        let result = fetcher.fetch("definitely not a url", dir.path()).await;

        assert!(matches!(result, Err(DiscernError::InvalidInput(_))));
    }
}
