// CLI MediaSource - uses the native `yt-dlp` binary
//
// Metadata comes from `--dump-json`; single streams are fetched with
// `-f <format_id> -o <dest>` so each transfer lands at a path we own.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use super::diagnostics::classify_failure;
use super::traits::{ExtractorConfig, MediaSource};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{AudioQuality, StreamFormat, StreamKind, VideoMetadata};
use crate::downloader::utils::{run_output, run_output_with_timeout, stderr_text};

/// CLI-based media source using the yt-dlp binary
pub struct YtDlpSource {
    config: ExtractorConfig,
}

impl YtDlpSource {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Flags shared by metadata and stream invocations
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }

    fn build_info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    fn build_fetch_args(&self, url: &str, format_id: &str, dest: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            format_id.to_string(),
            "--no-part".to_string(),
            "--force-overwrites".to_string(),
            "-o".to_string(),
            dest.to_string_lossy().to_string(),
        ];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    fn spawn_error(&self, e: io::Error, wrap: fn(String) -> DownloadError) -> DownloadError {
        if e.kind() == io::ErrorKind::NotFound {
            DownloadError::ToolNotFound(format!(
                "yt-dlp not found at {}",
                self.config.ytdlp_path.display()
            ))
        } else {
            wrap(format!("yt-dlp: {}", e))
        }
    }

    /// Parse `--dump-json` output
    pub fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, DownloadError> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let formats_array = json["formats"]
            .as_array()
            .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

        let formats = formats_array.iter().filter_map(Self::parse_format).collect();

        // `thumbnail` is the preferred one; otherwise the last (largest) listed
        let thumbnail_url = json["thumbnail"]
            .as_str()
            .or_else(|| {
                json["thumbnails"]
                    .as_array()
                    .and_then(|t| t.last())
                    .and_then(|t| t["url"].as_str())
            })
            .unwrap_or("")
            .to_string();

        Ok(VideoMetadata {
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            thumbnail_url,
            duration_seconds: json["duration"].as_f64().unwrap_or(0.0).max(0.0) as u64,
            uploader_name: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .unwrap_or("Unknown")
                .to_string(),
            formats,
        })
    }

    /// Map one yt-dlp format object; storyboards and other trackless entries are dropped.
    fn parse_format(f: &serde_json::Value) -> Option<StreamFormat> {
        let has_codec = |key: &str| {
            f[key]
                .as_str()
                .map_or(false, |c| c != "none" && !c.is_empty())
        };
        let has_video = has_codec("vcodec");
        let has_audio = has_codec("acodec");

        let height = f["height"].as_u64().map(|h| h as u32);
        let fps = f["fps"].as_f64().map(|v| v as f32);
        let abr = f["abr"].as_f64().map(|v| v as f32);
        let audio_quality = || {
            f["format_note"]
                .as_str()
                .and_then(AudioQuality::from_note)
                .unwrap_or_else(|| AudioQuality::from_bitrate(abr.unwrap_or(0.0)))
        };

        let kind = match (has_video, has_audio) {
            (true, true) => StreamKind::Combined {
                height,
                fps,
                audio_quality: audio_quality(),
            },
            (true, false) => StreamKind::VideoOnly { height, fps },
            (false, true) => StreamKind::AudioOnly {
                audio_quality: audio_quality(),
            },
            (false, false) => return None,
        };

        let id = f["format_id"].as_str()?.to_string();

        Some(StreamFormat {
            id,
            container: f["ext"].as_str().unwrap_or("").to_string(),
            kind,
            size_bytes: f["filesize"]
                .as_u64()
                .or_else(|| f["filesize_approx"].as_u64()),
            bitrate_kbps: f["tbr"].as_f64().map(|v| v as f32).or(abr),
        })
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn extract(&self, url: &str) -> Result<VideoMetadata, DownloadError> {
        let args = self.build_info_args(url);
        debug!(
            "[yt-dlp] {} {}",
            self.config.ytdlp_path.display(),
            args.join(" ")
        );

        let output = run_output_with_timeout(
            &self.config.ytdlp_path,
            &args,
            self.config.info_timeout_seconds,
        )
        .await
        .map_err(|e| self.spawn_error(e, DownloadError::ExtractionFailed))?;

        if !output.status.success() {
            let stderr = stderr_text(&output);
            let reason = classify_failure(&stderr);
            warn!(
                url = %url,
                reason = ?reason,
                "[yt-dlp] metadata extraction failed: {}",
                stderr
            );
            return Err(DownloadError::ExtractionFailed(stderr));
        }

        let metadata = Self::parse_metadata(&output.stdout)?;
        info!(
            url = %url,
            formats = metadata.formats.len(),
            "[yt-dlp] metadata extracted: {}",
            metadata.title
        );
        Ok(metadata)
    }

    async fn fetch(
        &self,
        url: &str,
        format: &StreamFormat,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        let args = self.build_fetch_args(url, &format.id, dest);
        debug!(format_id = %format.id, dest = %dest.display(), "[yt-dlp] fetching stream");

        let output = run_output(&self.config.ytdlp_path, &args)
            .await
            .map_err(|e| self.spawn_error(e, DownloadError::FetchFailed))?;

        if !output.status.success() {
            let stderr = stderr_text(&output);
            warn!(
                format_id = %format.id,
                reason = ?classify_failure(&stderr),
                "[yt-dlp] stream fetch failed: {}",
                stderr
            );
            return Err(DownloadError::FetchFailed(stderr));
        }

        if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
            return Err(DownloadError::FetchFailed(format!(
                "yt-dlp reported success but {} was not written",
                dest.display()
            )));
        }

        Ok(())
    }
}
