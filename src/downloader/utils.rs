// Helper functions shared by the extractor and the orchestrator

use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::errors::DownloadError;

/// Run command with timeout, capturing stdout and stderr.
///
/// The child is killed if the deadline passes or the future is dropped.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DownloadError::ToolNotFound(program.to_string()),
            _ => DownloadError::ExecutionError(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let waited = timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res?;
            let stdout = join_pipe(stdout_task).await?;
            let stderr = join_pipe(stderr_task).await?;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Timeout(timeout_secs))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::ExecutionError(format!("pipe reader failed: {}", e)))?
        .map_err(DownloadError::from)
}

/// Find the yt-dlp executable: explicit override, common paths, then PATH.
pub fn find_ytdlp() -> String {
    if let Ok(custom) = std::env::var("YTDLP_PATH") {
        if !custom.trim().is_empty() {
            return custom;
        }
    }

    let mut common_paths: Vec<PathBuf> = vec![
        PathBuf::from("/opt/homebrew/bin/yt-dlp"), // Homebrew on Apple Silicon
        PathBuf::from("/usr/local/bin/yt-dlp"),    // Homebrew on Intel Mac
        PathBuf::from("/usr/bin/yt-dlp"),          // System installation
    ];
    // pip install --user
    if let Some(home) = dirs::home_dir() {
        common_paths.push(home.join(".local/bin/yt-dlp"));
    }

    for path in common_paths {
        if path.exists() {
            return path.to_string_lossy().to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    "yt-dlp".to_string()
}

/// Format seconds as `M:SS` or `H:MM:SS`. Zero means live or unknown.
pub fn format_duration(secs: u64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        Some(format!("{}:{:02}:{:02}", hours, minutes, seconds))
    } else {
        Some(format!("{}:{:02}", minutes, seconds))
    }
}

/// Inverse of [`format_duration`]: colon-separated fields, most significant
/// first. Anything unparsable counts as zero.
pub fn parse_duration_text(text: &str) -> u64 {
    text.split(':')
        .try_fold(0u64, |acc, part| {
            part.trim().parse::<u64>().ok().map(|v| acc * 60 + v)
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), None);
        assert_eq!(format_duration(5).as_deref(), Some("0:05"));
        assert_eq!(format_duration(300).as_deref(), Some("5:00"));
        assert_eq!(format_duration(3723).as_deref(), Some("1:02:03"));
    }

    #[test]
    fn test_parse_duration_text() {
        assert_eq!(parse_duration_text("1:02:03"), 3723);
        assert_eq!(parse_duration_text("5:00"), 300);
        assert_eq!(parse_duration_text("Live"), 0);
        for secs in [1, 59, 60, 61, 3599, 3600, 86_399, 90_061] {
            let text = format_duration(secs).unwrap_or_default();
            assert_eq!(parse_duration_text(&text), secs, "{}", text);
        }
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let err = run_output_with_timeout("definitely-not-a-real-binary-xyz", &[], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = run_output_with_timeout("sleep", &["5".to_string()], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Timeout(1)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_output_with_timeout("echo", &["hello".to_string()], 5)
            .await
            .unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }
}
