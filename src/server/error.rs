// JSON error responses for the HTTP surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tracing::{error, warn};

use crate::downloader::DownloadError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The request cap elapsed before the work finished.
    pub fn timeout(limit: Duration) -> Self {
        warn!("[Server] request exceeded {}s cap", limit.as_secs());
        Self::new(StatusCode::GATEWAY_TIMEOUT, "Request timed out")
    }
}

impl From<DownloadError> for ApiError {
    fn from(err: DownloadError) -> Self {
        let status = if err.is_client_error() {
            warn!("[Server] rejected: {}", err);
            StatusCode::BAD_REQUEST
        } else {
            // full tool output goes to the log only
            error!("[Server] {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
