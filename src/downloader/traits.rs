// Trait seams between the service and its external collaborators

use std::path::PathBuf;

use async_trait::async_trait;

use super::errors::ApiError;
use super::models::{SearchResult, TrackMetadata};

/// Primary metadata tier (the YouTube Data API).
///
/// `Ok(None)` means the service answered but had nothing; `Err` means it
/// could not answer. Both send the caller to the extractor.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Title, duration and thumbnail for one video id
    async fn lookup(&self, video_id: &str) -> Result<Option<TrackMetadata>, ApiError>;

    /// Whether the id refers to an existing video
    async fn exists(&self, video_id: &str) -> Result<bool, ApiError>;

    /// Relevance-ordered search, durations included
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ApiError>;

    /// Ordered video ids of a playlist, at most `limit` (capped at 50)
    async fn playlist_items(&self, playlist_id: &str, limit: u32) -> Result<Vec<String>, ApiError>;
}

/// Runtime switch read before each generic video download.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// When on, video requests always download the file locally instead of
    /// trying to hand out a direct stream URL first.
    async fn local_video_download(&self) -> bool;
}

/// Fixed flag value, for hosts without a flag store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFlags {
    pub local_video_download: bool,
}

#[async_trait]
impl FeatureFlags for StaticFlags {
    async fn local_video_download(&self) -> bool {
        self.local_video_download
    }
}

/// Supplies the cookie file handed to every yt-dlp invocation.
pub trait CookieProvider: Send + Sync {
    fn cookie_file(&self) -> Option<PathBuf>;
}

/// Always the same cookie file (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticCookies(pub Option<PathBuf>);

impl CookieProvider for StaticCookies {
    fn cookie_file(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}
