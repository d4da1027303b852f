pub mod config;
pub mod downloader;
pub mod logging;
pub mod server;
