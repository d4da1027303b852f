// FormatSelector - unified format selection logic
//
// Two jobs:
// - Listing: turn the raw stream list into deduplicated, sorted entries for the client
// - Planning: pick the stream(s) a download request needs and how to combine them

use std::cmp::Ordering;
use std::collections::HashSet;

use super::errors::DownloadError;
use super::models::{AudioQuality, DownloadRequest, FormatEntry, StreamFormat};

/// Only this container is offered in the video listing
const LISTED_VIDEO_CONTAINER: &str = "mp4";
/// Audio deliverables are always MP3
pub const AUDIO_TARGET_EXT: &str = "mp3";
/// Merged video deliverables are always MP4
pub const MERGE_TARGET_EXT: &str = "mp4";

/// Which stream(s) to fetch and what to do with them afterwards
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPlan {
    /// One combined stream delivered as-is
    Combined(StreamFormat),
    /// One stream whose audio is delivered as MP3 (transcoded unless already MP3)
    Audio(StreamFormat),
    /// Video-only + audio-only pair, muxed into one MP4
    Merge {
        video: StreamFormat,
        audio: StreamFormat,
    },
}

impl SelectionPlan {
    pub fn streams(&self) -> Vec<&StreamFormat> {
        match self {
            Self::Combined(f) | Self::Audio(f) => vec![f],
            Self::Merge { video, audio } => vec![video, audio],
        }
    }

    /// Extension of the file the caller receives
    pub fn output_extension(&self) -> &str {
        match self {
            Self::Combined(f) => &f.container,
            Self::Audio(_) => AUDIO_TARGET_EXT,
            Self::Merge { .. } => MERGE_TARGET_EXT,
        }
    }

    pub fn needs_merge(&self) -> bool {
        matches!(self, Self::Merge { .. })
    }

    pub fn needs_transcode(&self) -> bool {
        matches!(self, Self::Audio(f) if !f.has_container(AUDIO_TARGET_EXT))
    }
}

pub struct FormatSelector;

impl FormatSelector {
    /// Video listing: MP4 streams carrying video, highest resolution first,
    /// one entry per resolution tier.
    pub fn video_catalog(formats: &[StreamFormat]) -> Vec<FormatEntry> {
        let mut candidates: Vec<&StreamFormat> = formats
            .iter()
            .filter(|f| f.has_video() && f.has_container(LISTED_VIDEO_CONTAINER))
            .collect();

        // stable sort: first-seen wins among equal tiers
        candidates.sort_by(|a, b| b.height().unwrap_or(0).cmp(&a.height().unwrap_or(0)));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|f| seen.insert(f.height()))
            .map(Self::video_entry)
            .collect()
    }

    /// Audio listing: audio-only streams, best tier first, one entry per
    /// (tier, container).
    pub fn audio_catalog(formats: &[StreamFormat]) -> Vec<FormatEntry> {
        let mut candidates: Vec<&StreamFormat> =
            formats.iter().filter(|f| f.is_audio_only()).collect();

        candidates.sort_by(|a, b| Self::audio_rank(b).cmp(&Self::audio_rank(a)));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|f| seen.insert((Self::audio_rank(f), f.container.to_ascii_lowercase())))
            .map(Self::audio_entry)
            .collect()
    }

    /// Decide which stream(s) serve the request.
    pub fn select(
        formats: &[StreamFormat],
        request: &DownloadRequest,
    ) -> Result<SelectionPlan, DownloadError> {
        let explicit = match request.format_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(
                formats
                    .iter()
                    .find(|f| f.id == id)
                    .ok_or_else(|| {
                        DownloadError::NoSuitableFormat("Selected format not available".to_string())
                    })?,
            ),
            _ => None,
        };

        if request.want_audio_only {
            if let Some(format) = explicit {
                if format.has_audio() {
                    return Ok(SelectionPlan::Audio(format.clone()));
                }
                return Err(DownloadError::NoSuitableFormat(
                    "Selected format has no audio track".to_string(),
                ));
            }
            let best = Self::best_audio_only(formats).ok_or_else(|| {
                DownloadError::NoSuitableFormat("No audio format available".to_string())
            })?;
            return Ok(SelectionPlan::Audio(best.clone()));
        }

        let video = match explicit {
            Some(format) if format.is_combined() => {
                return Ok(SelectionPlan::Combined(format.clone()));
            }
            Some(format) if format.is_video_only() => Some(format),
            // audio-only id on a video request: fall back to the best pair
            _ => None,
        };

        let video = video.or_else(|| Self::best_video_only(formats));
        let audio = Self::best_audio_only(formats);

        match (video, audio) {
            (Some(video), Some(audio)) => Ok(SelectionPlan::Merge {
                video: video.clone(),
                audio: audio.clone(),
            }),
            _ => Err(DownloadError::NoSuitableFormat(
                "Could not find suitable video or audio formats".to_string(),
            )),
        }
    }

    /// Highest resolution video-only stream; ties by fps, bitrate, then id.
    pub fn best_video_only(formats: &[StreamFormat]) -> Option<&StreamFormat> {
        formats
            .iter()
            .filter(|f| f.is_video_only())
            .max_by(|a, b| {
                a.height()
                    .unwrap_or(0)
                    .cmp(&b.height().unwrap_or(0))
                    .then_with(|| cmp_f32(a.fps(), b.fps()))
                    .then_with(|| cmp_f32(a.bitrate_kbps, b.bitrate_kbps))
                    .then_with(|| b.id.cmp(&a.id))
            })
    }

    /// Highest tier audio-only stream; ties by bitrate, then id.
    pub fn best_audio_only(formats: &[StreamFormat]) -> Option<&StreamFormat> {
        formats
            .iter()
            .filter(|f| f.is_audio_only())
            .max_by(|a, b| {
                Self::audio_rank(a)
                    .cmp(&Self::audio_rank(b))
                    .then_with(|| cmp_f32(a.bitrate_kbps, b.bitrate_kbps))
                    .then_with(|| b.id.cmp(&a.id))
            })
    }

    fn audio_rank(format: &StreamFormat) -> u8 {
        format.audio_quality().map_or(0, AudioQuality::rank)
    }

    fn video_entry(format: &StreamFormat) -> FormatEntry {
        let resolution = format.height().map(|h| format!("{}p", h));
        let quality_label = match (format.height(), format.fps()) {
            (Some(h), Some(fps)) if fps > 30.0 => format!("{}p{}", h, fps.round() as u32),
            (Some(h), _) => format!("{}p", h),
            (None, _) => "Unknown".to_string(),
        };

        FormatEntry {
            format_id: format.id.clone(),
            extension: format.container.clone(),
            resolution,
            audio_quality: None,
            filesize: format.size_bytes,
            fps: format.fps(),
            label: format!("{} ({})", quality_label, format.container),
        }
    }

    fn audio_entry(format: &StreamFormat) -> FormatEntry {
        let tier = format
            .audio_quality()
            .unwrap_or(AudioQuality::Unknown)
            .label();

        FormatEntry {
            format_id: format.id.clone(),
            extension: format.container.clone(),
            resolution: None,
            audio_quality: Some(tier.to_string()),
            filesize: format.size_bytes,
            fps: None,
            label: format!("{} ({})", tier, format.container),
        }
    }
}

fn cmp_f32(a: Option<f32>, b: Option<f32>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}
