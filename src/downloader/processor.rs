// ffmpeg-backed MediaProcessor

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use super::errors::DownloadError;
use super::traits::MediaProcessor;
use super::utils::{run_output, stderr_text};

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Target bitrate for MP3 output
    pub audio_bitrate_kbps: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_bitrate_kbps: 192,
        }
    }
}

pub struct FfmpegProcessor {
    config: ProcessorConfig,
}

impl FfmpegProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    fn base_args() -> Vec<String> {
        ["-y", "-hide_banner", "-nostdin", "-loglevel", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn transcode_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = Self::base_args();
        args.extend([
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
            output.to_string_lossy().to_string(),
        ]);
        args
    }

    fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        let mut args = Self::base_args();
        args.extend([
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            output.to_string_lossy().to_string(),
        ]);
        args
    }

    async fn run(&self, args: Vec<String>, step: &str) -> Result<(), DownloadError> {
        debug!("[ffmpeg] {} {}", self.config.ffmpeg_path.display(), args.join(" "));

        let output = run_output(&self.config.ffmpeg_path, &args)
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    DownloadError::ToolNotFound(format!(
                        "ffmpeg not found at {}",
                        self.config.ffmpeg_path.display()
                    ))
                } else {
                    DownloadError::MergeFailed(format!("ffmpeg {}: {}", step, e))
                }
            })?;

        if !output.status.success() {
            let stderr = stderr_text(&output);
            error!("[ffmpeg] {} failed: {}", step, stderr);
            return Err(DownloadError::MergeFailed(stderr));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn transcode_audio(&self, input: &Path, output: &Path) -> Result<(), DownloadError> {
        self.run(self.transcode_args(input, output), "transcode").await
    }

    async fn merge(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        self.run(Self::merge_args(video, audio, output), "merge").await
    }
}
