use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::downloader::tools::ToolInfo;
use crate::downloader::{DownloadError, DownloadRequest, VideoInfoResponse};

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    #[serde(default)]
    pub url: Option<String>,
    /// Clients send format ids both as strings and as bare numbers
    #[serde(default, deserialize_with = "format_id")]
    pub format: Option<String>,
    #[serde(default)]
    pub is_audio: bool,
}

fn format_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tools: Vec<ToolInfo>,
}

/// Missing body, unparsable JSON and absent url all read as "no URL".
fn require_url(url: Option<String>) -> Result<String, DownloadError> {
    url.filter(|u| !u.trim().is_empty())
        .ok_or(DownloadError::MissingUrl)
}

async fn with_cap<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    F: Future<Output = Result<T, DownloadError>>,
{
    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::timeout(state.request_timeout)),
    }
}

/// POST /api/youtube-info
pub async fn youtube_info(
    State(state): State<AppState>,
    body: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Json<VideoInfoResponse>> {
    let url = require_url(body.ok().and_then(|Json(b)| b.url))?;
    info!("[Server] info request for {}", url);

    let info = with_cap(&state, state.downloader.video_info(&url)).await?;
    Ok(Json(info))
}

/// POST /api/youtube-download
pub async fn youtube_download(
    State(state): State<AppState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> ApiResult<Response> {
    let body = body.ok().map(|Json(b)| b);
    let (url, format, is_audio) = match body {
        Some(b) => (b.url, b.format, b.is_audio),
        None => (None, None, false),
    };

    let request = DownloadRequest {
        source_url: require_url(url)?,
        format_id: format,
        want_audio_only: is_audio,
    };
    info!(
        format = ?request.format_id,
        audio = request.want_audio_only,
        "[Server] download request for {}",
        request.source_url
    );

    let result = with_cap(&state, state.downloader.download(&request)).await?;

    let disposition = format!("attachment; filename=\"{}\"", result.suggested_filename);
    let disposition = HeaderValue::from_str(&disposition).map_err(|_| {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to download video")
    })?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(result.mime_type)),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, HeaderValue::from(result.file_bytes.len())),
        ],
        result.file_bytes,
    )
        .into_response())
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let tools = state.tools.get_all_tools().await;
    let status = if tools.iter().all(|t| t.is_available) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, tools })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::orchestrator::tests::{FakeProcessor, FakeSource};
    use crate::downloader::service::tests::sample_metadata;
    use crate::downloader::{DownloadOrchestrator, Downloader, ToolManager};
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn state_with(source: FakeSource, root: &Path, cap: Duration) -> AppState {
        let source = Arc::new(source);
        let orchestrator =
            DownloadOrchestrator::new(source.clone(), Arc::new(FakeProcessor::default()), root);
        AppState {
            downloader: Arc::new(Downloader::new(source, orchestrator)),
            tools: Arc::new(ToolManager::new("/nonexistent/yt-dlp", "/nonexistent/ffmpeg")),
            request_timeout: cap,
        }
    }

    fn working_source() -> FakeSource {
        FakeSource {
            metadata: Some(sample_metadata()),
            ..Default::default()
        }
    }

    async fn error_body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_format_accepts_string_or_number() {
        let body: DownloadBody =
            serde_json::from_str(r#"{"url":"u","format":137,"isAudio":false}"#).unwrap();
        assert_eq!(body.format.as_deref(), Some("137"));

        let body: DownloadBody = serde_json::from_str(r#"{"url":"u","format":"251"}"#).unwrap();
        assert_eq!(body.format.as_deref(), Some("251"));
        assert!(!body.is_audio);

        let body: DownloadBody = serde_json::from_str(r#"{"url":"u","format":""}"#).unwrap();
        assert!(body.format.is_none());
    }

    #[tokio::test]
    async fn test_info_without_url_is_400() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let err = youtube_info(State(state), Ok(Json(InfoRequest { url: None })))
            .await
            .unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "URL is required");
    }

    #[tokio::test]
    async fn test_info_with_foreign_url_is_400() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let err = youtube_info(
            State(state),
            Ok(Json(InfoRequest {
                url: Some("https://vimeo.com/123".into()),
            })),
        )
        .await
        .unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid YouTube URL");
    }

    #[tokio::test]
    async fn test_info_returns_catalog() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let Json(info) = youtube_info(
            State(state),
            Ok(Json(InfoRequest {
                url: Some(URL.into()),
            })),
        )
        .await
        .unwrap();

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["duration"], "3:33");
        assert_eq!(json["videoFormats"][0]["formatId"], "137");
        assert_eq!(json["audioFormats"][0]["audioQuality"], "HIGH");
    }

    #[tokio::test]
    async fn test_extraction_failure_is_generic_500() {
        let root = tempdir().unwrap();
        let source = FakeSource {
            extract_error: Some(DownloadError::ExtractionFailed(
                "ERROR: Sign in to confirm you're not a bot".into(),
            )),
            ..Default::default()
        };
        let state = state_with(source, root.path(), Duration::from_secs(5));

        let err = youtube_info(
            State(state),
            Ok(Json(InfoRequest {
                url: Some(URL.into()),
            })),
        )
        .await
        .unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch video info");
    }

    #[tokio::test]
    async fn test_audio_download_headers() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let response = youtube_download(
            State(state),
            Ok(Json(DownloadBody {
                url: Some(URL.into()),
                format: None,
                is_audio: true,
            })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"Never Gonna Give You Up Official Video.mp3\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_format_is_400() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let Err(err) = youtube_download(
            State(state),
            Ok(Json(DownloadBody {
                url: Some(URL.into()),
                format: Some("999".into()),
                is_audio: false,
            })),
        )
        .await
        else {
            panic!("expected an error response");
        };
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Selected format not available");
    }

    #[tokio::test]
    async fn test_request_cap_returns_504_and_cleans_up() {
        let root = tempdir().unwrap();
        let source = FakeSource {
            metadata: Some(sample_metadata()),
            hanging_ids: HashSet::from(["137".to_string()]),
            ..Default::default()
        };
        let state = state_with(source, root.path(), Duration::from_millis(200));

        let Err(err) = youtube_download(
            State(state),
            Ok(Json(DownloadBody {
                url: Some(URL.into()),
                format: None,
                is_audio: false,
            })),
        )
        .await
        else {
            panic!("expected a timeout");
        };
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "Request timed out");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_health_reports_missing_tools() {
        let root = tempdir().unwrap();
        let state = state_with(working_source(), root.path(), Duration::from_secs(5));

        let Json(health) = health(State(state)).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.tools.len(), 2);
    }
}
