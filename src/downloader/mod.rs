// Downloader module - format selection and download orchestration

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod processor;
pub mod scratch;
pub mod service;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use extractors::{ExtractorConfig, MediaSource, YtDlpSource};
pub use format_selector::{FormatSelector, SelectionPlan};
pub use models::{DownloadRequest, DownloadResult, StreamFormat, VideoInfoResponse, VideoMetadata};
pub use orchestrator::DownloadOrchestrator;
pub use processor::{FfmpegProcessor, ProcessorConfig};
pub use service::Downloader;
pub use tools::ToolManager;
pub use traits::MediaProcessor;
