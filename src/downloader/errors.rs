// Error types for the download pipeline

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Request carried no URL at all
    #[error("URL is required")]
    MissingUrl,

    /// URL does not look like a YouTube watch/share link
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    /// The request matches none of the available streams
    #[error("{0}")]
    NoSuitableFormat(String),

    /// yt-dlp could not produce metadata for the URL
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// A stream transfer failed
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// ffmpeg failed to transcode or mux
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// yt-dlp or ffmpeg not found on the host
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Local filesystem failure (scratch dir, reading the result)
    #[error("I/O error: {0}")]
    Io(String),
}

impl DownloadError {
    /// Errors caused by the request itself rather than the host or the tools.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::InvalidUrl(_) | Self::NoSuitableFormat(_)
        )
    }

    /// Message that is safe to hand back to the caller.
    ///
    /// Tool diagnostics stay in the server log; callers only see a generic line.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingUrl => "URL is required".to_string(),
            Self::InvalidUrl(_) => "Invalid YouTube URL".to_string(),
            Self::NoSuitableFormat(msg) => msg.clone(),
            Self::ExtractionFailed(_) | Self::ParseError(_) => {
                "Failed to fetch video info".to_string()
            }
            Self::ToolNotFound(_) => "Media tools are not available on the server".to_string(),
            Self::FetchFailed(_) | Self::MergeFailed(_) | Self::Io(_) => {
                "Failed to download video".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(DownloadError::MissingUrl.is_client_error());
        assert!(DownloadError::InvalidUrl("x".into()).is_client_error());
        assert!(DownloadError::NoSuitableFormat("none".into()).is_client_error());
        assert!(!DownloadError::MergeFailed("boom".into()).is_client_error());
        assert!(!DownloadError::ExtractionFailed("boom".into()).is_client_error());
    }

    #[test]
    fn test_public_message_hides_tool_output() {
        let err = DownloadError::ExtractionFailed("ERROR: [youtube] abc: Sign in".into());
        assert_eq!(err.public_message(), "Failed to fetch video info");
        assert!(err.to_string().contains("Sign in"));

        let err = DownloadError::MergeFailed("Invalid data found when processing input".into());
        assert_eq!(err.public_message(), "Failed to download video");
    }

    #[test]
    fn test_public_message_keeps_validation_text() {
        assert_eq!(DownloadError::MissingUrl.public_message(), "URL is required");
        assert_eq!(
            DownloadError::InvalidUrl("https://example.com".into()).public_message(),
            "Invalid YouTube URL"
        );
        assert_eq!(
            DownloadError::NoSuitableFormat("Selected format not available".into())
                .public_message(),
            "Selected format not available"
        );
    }
}
