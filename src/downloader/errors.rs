// Error types for the resolver and the extraction tool

use thiserror::Error;

use super::extractors::{diagnose_error, summarize_stderr, BlockingReason};

/// Terminal failures from the extraction tier (yt-dlp).
///
/// Nothing falls back past this tier, so these propagate to the caller.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp not found or could not be spawned
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// YouTube refused the request; `detail` is the most useful stderr line
    #[error("{}: {detail}", .reason.description())]
    Blocked {
        reason: BlockingReason,
        detail: String,
    },

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The tool did not finish before its deadline
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// A search returned no entries
    #[error("No results for query: {0}")]
    NoResults(String),

    /// The tool reported success but the expected file is not on disk
    #[error("Download finished but {0} is missing")]
    OutputMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Build an error from a failed run's stderr, classifying known blocks.
    pub fn from_stderr(stderr: &str) -> Self {
        let detail = summarize_stderr(stderr);
        match diagnose_error(stderr) {
            Some(BlockingReason::Unknown) | None => Self::ExecutionError(detail),
            Some(reason) => Self::Blocked { reason, detail },
        }
    }

    /// The failure looks like a cookie problem; a fresh cookie file may fix it
    pub fn needs_fresh_cookies(&self) -> bool {
        self.blocking_reason()
            .map_or(false, |r| r.cookies_might_help())
    }

    /// Retrying the same video will not help (deleted, private)
    pub fn is_permanent(&self) -> bool {
        self.blocking_reason().map_or(false, |r| r.is_permanent())
    }

    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::Blocked { reason, .. } => Some(*reason),
            Self::Timeout(_) => Some(BlockingReason::NetworkTimeout),
            _ => None,
        }
    }
}

/// Failures talking to the YouTube Data API.
///
/// These never reach the caller of a resolution: they are logged and the
/// resolution falls through to the extractor.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Unexpected API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when retrying the API is pointless for the rest of the process:
    /// missing or rejected key, exhausted quota.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::MissingApiKey => true,
            Self::Status { status, reason } => {
                matches!(status, 401 | 403)
                    || (*status == 400 && reason.to_lowercase().contains("keyinvalid"))
            }
            _ => false,
        }
    }
}
