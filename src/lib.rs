// YouTube resolver - track metadata and media for YouTube references
//
// YouTubeService asks the YouTube Data API first and falls back to a local
// yt-dlp binary, memoizing every answer. Downloads always go through yt-dlp.

pub mod api;
pub mod cache;
pub mod config;
pub mod downloader;
pub mod identifier;
pub mod message;
pub mod service;

#[cfg(test)]
mod testing;

pub use cache::CachePolicy;
pub use config::{ApiConfig, ServiceConfig};
pub use downloader::{
    ApiError, DownloadError, DownloadMode, DownloadResult, FeatureFlags, FormatDescriptor,
    SearchResult, StaticFlags, TrackMetadata,
};
pub use identifier::{extract_playlist_id, extract_video_id, Reference};
pub use message::{extract_link_from_message, Entity, Message};
pub use service::YouTubeService;
