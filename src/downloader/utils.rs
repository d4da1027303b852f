// Helper functions shared by the extractor, processor and orchestrator

use regex::Regex;
use std::io;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

lazy_static::lazy_static! {
    static ref YOUTUBE_URL_RE: Regex = Regex::new(
        r"^(https?://)?((www|m|music)\.)?(youtube\.com|youtu\.be)/.+"
    ).unwrap();
}

/// Run command with timeout (shared utility).
///
/// A timeout surfaces as `io::ErrorKind::TimedOut`; the child is killed.
pub async fn run_output_with_timeout(
    program: &Path,
    args: &[String],
    timeout_secs: u64,
) -> io::Result<Output> {
    run_command(program, args, Some(Duration::from_secs(timeout_secs))).await
}

/// Run command to completion, with no limit of its own.
///
/// The child is killed if the returned future is dropped, so an outer
/// request cap still bounds it.
pub async fn run_output(program: &Path, args: &[String]) -> io::Result<Output> {
    run_command(program, args, None).await
}

async fn run_command(
    program: &Path,
    args: &[String],
    limit: Option<Duration>,
) -> io::Result<Output> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("failed to capture stdout"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("failed to capture stderr"))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, io::Error>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, io::Error>(buf)
    });

    let status = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("Timed out after {}s", limit.as_secs()),
                ));
            }
        },
        None => child.wait().await?,
    };

    let stdout = stdout_task.await.map_err(io::Error::other)??;
    let stderr = stderr_task.await.map_err(io::Error::other)??;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// Trimmed stderr of a finished tool, or a placeholder when it said nothing.
pub fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("exited with {}", output.status)
    } else {
        text
    }
}

/// Check the URL against the accepted YouTube host patterns.
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL_RE.is_match(url.trim())
}

/// `H:MM:SS` for an hour or more, otherwise `M:SS`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Turn a video title into a file stem: ASCII word characters and single
/// spaces only.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else if c.is_whitespace() {
            pending_space = true;
        }
    }

    if out.is_empty() {
        "download".to_string()
    } else {
        out
    }
}

/// MIME type for a delivered file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "opus" => "audio/opus",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_patterns() {
        assert!(is_youtube_url("https://youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("http://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("m.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("  https://youtu.be/abc  "));

        assert!(!is_youtube_url(""));
        assert!(!is_youtube_url("not a url"));
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(!is_youtube_url("https://youtube.com/"));
        assert!(!is_youtube_url("https://evil.com/youtube.com/watch?v=abc"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(212), "3:32");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Rick Astley - Never Gonna Give You Up (Official)"),
            "Rick Astley Never Gonna Give You Up Official");
        assert_eq!(sanitize_title("  lo-fi / beats_24/7  "), "lofi beats_247");
        assert_eq!(sanitize_title("Ünïcödé"), "ncd");
        assert_eq!(sanitize_title("!!!"), "download");
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_for_extension("mp4"), "video/mp4");
        assert_eq!(mime_for_extension("MP3"), "audio/mpeg");
        assert_eq!(mime_for_extension("m4a"), "audio/mp4");
        assert_eq!(mime_for_extension("mkv"), "application/octet-stream");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_output_captures_streams() {
        let out = run_output(
            Path::new("sh"),
            &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "out");
        assert_eq!(stderr_text(&out), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_output_with_timeout_kills_child() {
        let err = run_output_with_timeout(
            Path::new("sh"),
            &["-c".to_string(), "sleep 5".to_string()],
            1,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let err = run_output(Path::new("definitely-not-a-real-tool-xyz"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
