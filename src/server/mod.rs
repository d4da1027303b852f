// HTTP surface: routes, shared state and startup

pub mod error;
pub mod handlers;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::downloader::{
    DownloadOrchestrator, Downloader, FfmpegProcessor, ToolManager, YtDlpSource,
};

#[derive(Clone)]
pub struct AppState {
    pub downloader: Arc<Downloader>,
    pub tools: Arc<ToolManager>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wire the yt-dlp source and ffmpeg processor from configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let source = Arc::new(YtDlpSource::new(config.extractor.clone()));
        let processor = Arc::new(FfmpegProcessor::new(config.processor.clone()));
        let orchestrator =
            DownloadOrchestrator::new(source.clone(), processor, config.scratch_root.clone());

        Self {
            downloader: Arc::new(Downloader::new(source, orchestrator)),
            tools: Arc::new(ToolManager::new(
                config.extractor.ytdlp_path.clone(),
                config.processor.ffmpeg_path.clone(),
            )),
            request_timeout: config.request_timeout,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/youtube-info", post(handlers::youtube_info))
        .route("/api/youtube-download", post(handlers::youtube_download))
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.scratch_root)
        .await
        .with_context(|| format!("creating scratch root {}", config.scratch_root.display()))?;

    let state = AppState::from_config(&config);
    state.tools.log_status().await;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding to {}", config.bind_addr))?;
    info!(
        scratch = %config.scratch_root.display(),
        timeout_secs = config.request_timeout.as_secs(),
        "[Server] listening on http://{}",
        config.bind_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    info!("[Server] stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("[Server] failed to install Ctrl+C handler: {}", err);
    }
}
