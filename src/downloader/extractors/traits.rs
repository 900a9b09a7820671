// TrackExtractor trait and common types

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::TrackMetadata;

/// Configuration for yt-dlp invocations
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// yt-dlp binary
    pub ytdlp_path: String,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Deadline for metadata calls (search, format listing, id probe)
    pub timeout_seconds: u64,
    /// Deadline for the direct stream URL probe
    pub direct_url_timeout_seconds: u64,
    /// Deadline for a full download
    pub download_timeout_seconds: u64,
    /// YouTube player client (android, web, tv)
    pub player_client: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            proxy: None,
            timeout_seconds: 60,
            direct_url_timeout_seconds: 30,
            download_timeout_seconds: 600,
            player_client: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_download_timeout(mut self, seconds: u64) -> Self {
        self.download_timeout_seconds = seconds;
        self
    }

    pub fn with_player_client(mut self, client: Option<String>) -> Self {
        self.player_client = client;
        self
    }
}

/// Format entry as yt-dlp reports it; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFormat {
    /// Human label, e.g. "137 - 1920x1080 (1080p)"
    pub format: Option<String>,
    pub filesize: Option<u64>,
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub format_note: Option<String>,
}

/// Everything a full download needs besides the link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProfile {
    /// `-f` selector
    pub format: String,
    /// `-o` template
    pub output_template: PathBuf,
    /// File the template resolves to once post-processing is done
    pub output_path: PathBuf,
    /// Post-processing flags (`-x`, `--merge-output-format`, ...)
    pub extra_args: Vec<String>,
}

/// Local extraction tool, used as the fallback metadata tier and for all
/// downloads. Every failure here is terminal.
#[async_trait]
pub trait TrackExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// First result of a tool-side search for `query`
    async fn search_first(&self, query: &str) -> Result<TrackMetadata, DownloadError>;

    /// All formats the tool reports for `link`, unfiltered, in source order
    async fn formats(&self, link: &str) -> Result<Vec<RawFormat>, DownloadError>;

    /// Canonical video id for a link the regexes could not parse
    async fn video_id(&self, link: &str) -> Result<String, DownloadError>;

    /// First direct stream URL for `format`; `None` when the tool exited
    /// cleanly but printed nothing
    async fn direct_url(&self, link: &str, format: &str) -> Result<Option<String>, DownloadError>;

    /// Download `link` according to `profile`
    async fn download(&self, link: &str, profile: &DownloadProfile) -> Result<(), DownloadError>;
}
