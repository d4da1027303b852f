// Media processor trait definition

use async_trait::async_trait;
use std::path::Path;

use super::errors::DownloadError;

/// Trait for the transcode / mux step
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Name of the processor (for logging)
    fn name(&self) -> &'static str;

    /// Re-encode the audio of `input` into the container implied by `output`
    async fn transcode_audio(&self, input: &Path, output: &Path) -> Result<(), DownloadError>;

    /// Mux a video-only and an audio-only file into `output`, copying the video codec
    async fn merge(&self, video: &Path, audio: &Path, output: &Path)
        -> Result<(), DownloadError>;
}
