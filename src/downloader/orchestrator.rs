// Download orchestrator: fetch -> combine -> finalize, cleanup on every exit

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::errors::DownloadError;
use super::extractors::MediaSource;
use super::format_selector::{SelectionPlan, AUDIO_TARGET_EXT, MERGE_TARGET_EXT};
use super::models::DownloadResult;
use super::scratch::ScratchSpace;
use super::traits::MediaProcessor;
use super::utils::{mime_for_extension, sanitize_title};

/// Stage of one in-flight download, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Combining,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::Combining => write!(f, "combining"),
            Self::Finalizing => write!(f, "finalizing"),
        }
    }
}

pub struct DownloadOrchestrator {
    source: Arc<dyn MediaSource>,
    processor: Arc<dyn MediaProcessor>,
    scratch_root: PathBuf,
}

impl DownloadOrchestrator {
    pub fn new(
        source: Arc<dyn MediaSource>,
        processor: Arc<dyn MediaProcessor>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            processor,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Execute a plan for `url` and return the finished file.
    ///
    /// All intermediate files live in one ScratchSpace that is dropped before
    /// this returns, whatever the outcome.
    pub async fn run(
        &self,
        url: &str,
        title: &str,
        plan: &SelectionPlan,
    ) -> Result<DownloadResult, DownloadError> {
        let scratch = ScratchSpace::create(&self.scratch_root).await?;
        let id = scratch.id().to_string();

        let outcome = self.execute(&scratch, url, title, plan).await;
        if let Err(e) = &outcome {
            warn!(download_id = %id, "[Downloader] failed: {}", e);
        }
        outcome
    }

    async fn execute(
        &self,
        scratch: &ScratchSpace,
        url: &str,
        title: &str,
        plan: &SelectionPlan,
    ) -> Result<DownloadResult, DownloadError> {
        let id = scratch.id();
        info!(
            download_id = %id,
            stage = %Stage::Fetching,
            streams = plan.streams().len(),
            "[Downloader] {}",
            url
        );

        let delivered = match plan {
            SelectionPlan::Combined(format) => {
                let path = scratch.path_for(&format!("combined.{}", format.container));
                self.source.fetch(url, format, &path).await?;
                path
            }
            SelectionPlan::Audio(format) => {
                let input = scratch.path_for(&format!("audio.{}", format.container));
                self.source.fetch(url, format, &input).await?;

                if plan.needs_transcode() {
                    info!(download_id = %id, stage = %Stage::Combining, "[Downloader] transcoding to {}", AUDIO_TARGET_EXT);
                    let output = scratch.path_for(&format!("output.{}", AUDIO_TARGET_EXT));
                    self.processor.transcode_audio(&input, &output).await?;
                    output
                } else {
                    input
                }
            }
            SelectionPlan::Merge { video, audio } => {
                let video_path = scratch.path_for(&format!("video.{}", video.container));
                let audio_path = scratch.path_for(&format!("audio.{}", audio.container));

                // first failure wins; the other transfer is dropped (child killed)
                tokio::try_join!(
                    self.source.fetch(url, video, &video_path),
                    self.source.fetch(url, audio, &audio_path),
                )?;

                info!(download_id = %id, stage = %Stage::Combining, "[Downloader] merging {} + {}", video.id, audio.id);
                let output = scratch.path_for(&format!("output.{}", MERGE_TARGET_EXT));
                self.processor
                    .merge(&video_path, &audio_path, &output)
                    .await?;
                output
            }
        };

        info!(download_id = %id, stage = %Stage::Finalizing, "[Downloader] reading result");
        let file_bytes = tokio::fs::read(&delivered).await.map_err(|e| {
            DownloadError::Io(format!("Failed to read {}: {}", delivered.display(), e))
        })?;

        let ext = plan.output_extension().to_ascii_lowercase();
        let result = DownloadResult {
            suggested_filename: format!("{}.{}", sanitize_title(title), ext),
            mime_type: mime_for_extension(&ext),
            file_bytes,
        };

        info!(
            download_id = %id,
            bytes = result.file_bytes.len(),
            "[Downloader] completed: {}",
            result.suggested_filename
        );
        Ok(result)
    }
}
