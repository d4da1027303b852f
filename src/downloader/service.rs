// Downloader facade: validate -> extract -> select -> orchestrate

use std::sync::Arc;
use tracing::info;

use super::errors::DownloadError;
use super::extractors::MediaSource;
use super::format_selector::FormatSelector;
use super::models::{DownloadRequest, DownloadResult, VideoInfoResponse};
use super::orchestrator::DownloadOrchestrator;
use super::utils::{format_duration, is_youtube_url};

pub struct Downloader {
    source: Arc<dyn MediaSource>,
    orchestrator: DownloadOrchestrator,
}

impl Downloader {
    pub fn new(source: Arc<dyn MediaSource>, orchestrator: DownloadOrchestrator) -> Self {
        Self {
            source,
            orchestrator,
        }
    }

    /// Reject missing or non-YouTube URLs before any tool is invoked.
    pub fn validate_url(url: &str) -> Result<&str, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::MissingUrl);
        }
        if !is_youtube_url(url) {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }
        Ok(url)
    }

    /// GetVideoInfo
    pub async fn video_info(&self, url: &str) -> Result<VideoInfoResponse, DownloadError> {
        let url = Self::validate_url(url)?;
        let metadata = self.source.extract(url).await?;

        Ok(VideoInfoResponse {
            duration: format_duration(metadata.duration_seconds),
            video_formats: FormatSelector::video_catalog(&metadata.formats),
            audio_formats: FormatSelector::audio_catalog(&metadata.formats),
            title: metadata.title,
            thumbnail: metadata.thumbnail_url,
            uploader: metadata.uploader_name,
        })
    }

    /// DownloadMedia
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult, DownloadError> {
        let url = Self::validate_url(&request.source_url)?;
        let metadata = self.source.extract(url).await?;
        let plan = FormatSelector::select(&metadata.formats, request)?;

        info!(
            source = self.source.name(),
            streams = ?plan.streams().iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
            audio_only = request.want_audio_only,
            "[Downloader] plan selected for {}",
            metadata.title
        );

        self.orchestrator.run(url, &metadata.title, &plan).await
    }
}
