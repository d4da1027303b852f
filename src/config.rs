// Service configuration, read from YTDL_* environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::downloader::extractors::ExtractorConfig;
use crate::downloader::processor::ProcessorConfig;
use crate::downloader::tools::{resolve_tool_path, ToolType};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Parent directory of per-request scratch directories
    pub scratch_root: PathBuf,
    /// Overall cap for one info or download request
    pub request_timeout: Duration,
    pub extractor: ExtractorConfig,
    pub processor: ProcessorConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset. Tool paths that are not given are resolved
    /// on the host.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr: SocketAddr = parse_var("YTDL_BIND", get("YTDL_BIND"), DEFAULT_BIND)?;

        let scratch_root = get("YTDL_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("youtube-downloader"));

        let timeout_secs: u64 = parse_var(
            "YTDL_REQUEST_TIMEOUT_SECS",
            get("YTDL_REQUEST_TIMEOUT_SECS"),
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "YTDL_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let ytdlp_path = get("YTDL_YTDLP_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| resolve_tool_path(ToolType::YtDlp));
        let ffmpeg_path = get("YTDL_FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| resolve_tool_path(ToolType::Ffmpeg));

        let extractor = ExtractorConfig::default()
            .with_ytdlp_path(ytdlp_path)
            .with_proxy(get("YTDL_PROXY"))
            .with_cookies_path(get("YTDL_COOKIES"));

        let processor = ProcessorConfig {
            ffmpeg_path,
            ..ProcessorConfig::default()
        };

        Ok(Self {
            bind_addr,
            scratch_root,
            request_timeout: Duration::from_secs(timeout_secs),
            extractor,
            processor,
        })
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.scratch_root.ends_with("youtube-downloader"));
        assert_eq!(config.extractor.socket_timeout_seconds, 15);
        assert_eq!(config.processor.audio_bitrate_kbps, 192);
        assert!(config.extractor.proxy.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("YTDL_BIND", "0.0.0.0:9000"),
            ("YTDL_SCRATCH_DIR", "/srv/scratch"),
            ("YTDL_REQUEST_TIMEOUT_SECS", "60"),
            ("YTDL_YTDLP_PATH", "/opt/bin/yt-dlp"),
            ("YTDL_FFMPEG_PATH", "/opt/bin/ffmpeg"),
            ("YTDL_PROXY", "socks5://127.0.0.1:1080"),
            ("YTDL_COOKIES", "  "),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.scratch_root, PathBuf::from("/srv/scratch"));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.extractor.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.processor.ffmpeg_path, PathBuf::from("/opt/bin/ffmpeg"));
        assert_eq!(config.extractor.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert!(config.extractor.cookies_path.is_none());
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = ServiceConfig::from_lookup(lookup(&[("YTDL_BIND", "localhost")])).unwrap_err();
        assert!(err.to_string().starts_with("YTDL_BIND"));

        let err = ServiceConfig::from_lookup(lookup(&[("YTDL_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("YTDL_REQUEST_TIMEOUT_SECS"));

        let err = ServiceConfig::from_lookup(lookup(&[("YTDL_REQUEST_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
