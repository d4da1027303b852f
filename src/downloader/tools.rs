use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::utils::run_output_with_timeout;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: String,
    pub is_available: bool,
}

/// Locate a tool binary: common install paths, then PATH, else the bare name.
pub fn resolve_tool_path(tool_type: ToolType) -> PathBuf {
    let binary_name = tool_type.as_str();

    let common_paths = [
        format!("/opt/homebrew/bin/{}", binary_name),
        format!("/usr/local/bin/{}", binary_name),
        format!("/usr/bin/{}", binary_name),
    ];

    for path in common_paths {
        if Path::new(&path).exists() {
            return PathBuf::from(path);
        }
    }

    which::which(binary_name).unwrap_or_else(|_| PathBuf::from(binary_name))
}

/// Reports which external tools the service can actually run
pub struct ToolManager {
    ytdlp_path: PathBuf,
    ffmpeg_path: PathBuf,
}

impl ToolManager {
    pub fn new(ytdlp_path: impl Into<PathBuf>, ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn path_for(&self, tool_type: ToolType) -> &Path {
        match tool_type {
            ToolType::YtDlp => &self.ytdlp_path,
            ToolType::Ffmpeg => &self.ffmpeg_path,
        }
    }

    pub async fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.path_for(tool_type);
        let version = Self::get_version(path, tool_type).await;

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: version.is_some(),
            version,
            path: path.display().to_string(),
        }
    }

    pub async fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp).await,
            self.get_tool_info(ToolType::Ffmpeg).await,
        ]
    }

    /// Log availability of every tool; missing tools are a warning, not fatal.
    pub async fn log_status(&self) {
        for tool in self.get_all_tools().await {
            if tool.is_available {
                info!(
                    "[Tools] {} {} at {}",
                    tool.name,
                    tool.version.as_deref().unwrap_or("?"),
                    tool.path
                );
            } else {
                warn!("[Tools] {} not available at {}", tool.name, tool.path);
            }
        }
    }

    async fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
        match run_output_with_timeout(path, &[tool_type.version_arg().to_string()], 10).await {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line carries the version
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
            }
            _ => None,
        }
    }
}
