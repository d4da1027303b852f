// MediaSource trait and extractor configuration

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{StreamFormat, VideoMetadata};

/// Configuration for the yt-dlp extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// yt-dlp binary
    pub ytdlp_path: PathBuf,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// `--socket-timeout` passed to yt-dlp
    pub socket_timeout_seconds: u32,
    /// Hard limit for one metadata extraction
    pub info_timeout_seconds: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            proxy: None,
            cookies_path: None,
            socket_timeout_seconds: 15,
            info_timeout_seconds: 30,
        }
    }
}

impl ExtractorConfig {
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_seconds = seconds;
        self
    }

    pub fn with_info_timeout(mut self, seconds: u64) -> Self {
        self.info_timeout_seconds = seconds;
        self
    }
}

/// Where video metadata and raw streams come from
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Fetch title, duration, uploader, thumbnail and the full format list
    async fn extract(&self, url: &str) -> Result<VideoMetadata, DownloadError>;

    /// Write one stream of `url` to `dest`
    async fn fetch(
        &self,
        url: &str,
        format: &StreamFormat,
        dest: &Path,
    ) -> Result<(), DownloadError>;
}
