// Common data models for the downloader

use serde::{Deserialize, Serialize};

/// Audio quality tier as reported by YouTube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioQuality {
    Unknown,
    Low,
    Medium,
    High,
}

impl AudioQuality {
    /// Ordering weight used when sorting: HIGH=3, MEDIUM=2, LOW=1, unknown=0
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unknown => "Standard",
        }
    }

    /// Parse a yt-dlp `format_note` such as "medium" or "ultralow, DRC".
    pub fn from_note(note: &str) -> Option<Self> {
        let lower = note.to_lowercase();
        if lower.contains("high") {
            Some(Self::High)
        } else if lower.contains("medium") {
            Some(Self::Medium)
        } else if lower.contains("low") {
            // covers "ultralow" as well
            Some(Self::Low)
        } else {
            None
        }
    }

    /// Fallback tier when the extractor gives no note, by audio bitrate in kbps.
    pub fn from_bitrate(kbps: f32) -> Self {
        if kbps >= 160.0 {
            Self::High
        } else if kbps >= 96.0 {
            Self::Medium
        } else if kbps > 0.0 {
            Self::Low
        } else {
            Self::Unknown
        }
    }
}

/// What a stream carries. Each variant holds only the fields valid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamKind {
    /// Video and audio already in one container
    Combined {
        height: Option<u32>,
        fps: Option<f32>,
        audio_quality: AudioQuality,
    },
    VideoOnly {
        height: Option<u32>,
        fps: Option<f32>,
    },
    AudioOnly {
        audio_quality: AudioQuality,
    },
}

/// One retrievable encoding of the source video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Extractor format id (e.g. "137", "140"), unique within one video
    pub id: String,
    /// Container / file extension (mp4, webm, m4a)
    pub container: String,
    pub kind: StreamKind,
    /// Declared content length, exact or approximate
    pub size_bytes: Option<u64>,
    /// Total bitrate in kbps, used to break ties
    pub bitrate_kbps: Option<f32>,
}

impl StreamFormat {
    pub fn has_video(&self) -> bool {
        !matches!(self.kind, StreamKind::AudioOnly { .. })
    }

    pub fn has_audio(&self) -> bool {
        !matches!(self.kind, StreamKind::VideoOnly { .. })
    }

    pub fn is_combined(&self) -> bool {
        matches!(self.kind, StreamKind::Combined { .. })
    }

    pub fn is_video_only(&self) -> bool {
        matches!(self.kind, StreamKind::VideoOnly { .. })
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self.kind, StreamKind::AudioOnly { .. })
    }

    pub fn height(&self) -> Option<u32> {
        match self.kind {
            StreamKind::Combined { height, .. } | StreamKind::VideoOnly { height, .. } => height,
            StreamKind::AudioOnly { .. } => None,
        }
    }

    pub fn fps(&self) -> Option<f32> {
        match self.kind {
            StreamKind::Combined { fps, .. } | StreamKind::VideoOnly { fps, .. } => fps,
            StreamKind::AudioOnly { .. } => None,
        }
    }

    pub fn audio_quality(&self) -> Option<AudioQuality> {
        match self.kind {
            StreamKind::Combined { audio_quality, .. }
            | StreamKind::AudioOnly { audio_quality } => Some(audio_quality),
            StreamKind::VideoOnly { .. } => None,
        }
    }

    pub fn has_container(&self, ext: &str) -> bool {
        self.container.eq_ignore_ascii_case(ext)
    }
}

/// Video information extracted from YouTube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail_url: String,
    pub duration_seconds: u64,
    pub uploader_name: String,
    pub formats: Vec<StreamFormat>,
}

/// What the caller asked to download
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub source_url: String,
    pub format_id: Option<String>,
    pub want_audio_only: bool,
}

/// Finished deliverable, consumed once by the transport layer
#[derive(Debug)]
pub struct DownloadResult {
    pub file_bytes: Vec<u8>,
    pub suggested_filename: String,
    pub mime_type: &'static str,
}

/// Format entry as listed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatEntry {
    pub format_id: String,
    pub extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    pub label: String,
}

/// GetVideoInfo response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResponse {
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub uploader: String,
    pub video_formats: Vec<FormatEntry>,
    pub audio_formats: Vec<FormatEntry>,
}
