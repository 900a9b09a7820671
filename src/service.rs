// YouTubeService - the resolver every command goes through
//
// Metadata is resolved against the Data API first and the yt-dlp extractor
// second. Once the API fails in a way retrying cannot fix (missing key,
// forbidden, quota) the service stops asking it for the rest of its life.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::api::YouTubeApi;
use crate::cache::{CachePolicy, ResultCache};
use crate::config::ServiceConfig;
use crate::downloader::errors::{ApiError, DownloadError};
use crate::downloader::extractors::{CliExtractor, TrackExtractor};
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{
    DownloadMode, DownloadResult, FormatDescriptor, SearchResult, TrackMetadata,
};
use crate::downloader::orchestrator::DownloadOrchestrator;
use crate::downloader::traits::{FeatureFlags, MetadataSource, StaticCookies};
use crate::identifier::Reference;
use crate::message::{extract_link_from_message, Message};

/// Results fetched for `slider`
const SLIDER_RESULTS: u32 = 10;
/// Single stream up to 720p, for players that take a URL
const STREAM_FORMAT: &str = "best[height<=?720][width<=?1280]";

pub struct YouTubeService {
    primary: Arc<dyn MetadataSource>,
    extractor: Arc<dyn TrackExtractor>,
    orchestrator: DownloadOrchestrator,
    /// Unset until the primary tier fails permanently, then `true`
    fallback: OnceLock<bool>,
    tracks: ResultCache<Reference, TrackMetadata>,
    existence: ResultCache<Reference, bool>,
    playlists: ResultCache<(Reference, u32), Vec<String>>,
    sliders: ResultCache<(String, usize), TrackMetadata>,
    formats: ResultCache<Reference, (Vec<FormatDescriptor>, String)>,
}

impl YouTubeService {
    /// Data API client plus yt-dlp, wired from `config`.
    pub fn new(config: ServiceConfig, flags: Arc<dyn FeatureFlags>) -> Result<Self, ApiError> {
        let primary = Arc::new(YouTubeApi::new(config.api)?);
        let extractor = Arc::new(
            CliExtractor::new(config.extractor)
                .with_cookies(Arc::new(StaticCookies(config.cookies_path))),
        );
        Ok(Self::with_parts(
            primary,
            extractor,
            flags,
            config.download_dir,
            config.cache,
        ))
    }

    pub fn with_parts(
        primary: Arc<dyn MetadataSource>,
        extractor: Arc<dyn TrackExtractor>,
        flags: Arc<dyn FeatureFlags>,
        download_dir: impl Into<PathBuf>,
        cache: CachePolicy,
    ) -> Self {
        info!(
            "[YouTubeService] primary: {}, fallback: {}",
            primary.name(),
            extractor.name()
        );
        Self {
            orchestrator: DownloadOrchestrator::new(extractor.clone(), flags, download_dir),
            primary,
            extractor,
            fallback: OnceLock::new(),
            tracks: ResultCache::new(cache),
            existence: ResultCache::new(cache),
            playlists: ResultCache::new(cache),
            sliders: ResultCache::new(cache),
            formats: ResultCache::new(cache),
        }
    }

    /// `None` while the primary tier is trusted, `Some(true)` once it was
    /// given up on.
    pub fn fallback_state(&self) -> Option<bool> {
        self.fallback.get().copied()
    }

    fn primary_disabled(&self) -> bool {
        self.fallback_state() == Some(true)
    }

    fn record_api_error(&self, operation: &str, err: &ApiError) {
        warn!("[YouTubeService] {} via {} failed: {}", operation, self.primary.name(), err);
        if err.is_permanent() && self.fallback.set(true).is_ok() {
            info!("[YouTubeService] {} disabled, using {} from now on", self.primary.name(), self.extractor.name());
        }
    }

    /// Resolve a reference to track metadata.
    ///
    /// Ids and links go through an API lookup, search text through an API
    /// search; an empty answer or an API failure falls through to the
    /// extractor's own search. Only extractor errors reach the caller.
    pub async fn track(&self, reference: &Reference) -> Result<TrackMetadata, DownloadError> {
        let loaded = self
            .tracks
            .get_or_load(reference.clone(), || async {
                self.resolve_track(reference).await.map(Some)
            })
            .await?;
        loaded.ok_or_else(|| DownloadError::NoResults(reference.as_str().to_string()))
    }

    async fn resolve_track(&self, reference: &Reference) -> Result<TrackMetadata, DownloadError> {
        if self.primary_disabled() {
            debug!("[YouTubeService] Primary tier disabled, skipping");
        } else {
            match self.primary_track(reference).await {
                Ok(Some(track)) => return Ok(track),
                Ok(None) => debug!("[YouTubeService] No API match for {}", reference.as_str()),
                Err(e) => self.record_api_error("track", &e),
            }
        }

        let query = reference.link();
        info!("[YouTubeService] Falling back to {} for {}", self.extractor.name(), query);
        self.extractor.search_first(&query).await
    }

    async fn primary_track(&self, reference: &Reference) -> Result<Option<TrackMetadata>, ApiError> {
        match reference.video_id() {
            Some(id) => self.primary.lookup(&id).await,
            None => {
                let results = self.primary.search(reference.as_str(), 1).await?;
                Ok(results.into_iter().next().map(SearchResult::into_metadata))
            }
        }
    }

    /// Same as [`track`](Self::track); the field shortcuts below project it.
    pub async fn details(&self, reference: &Reference) -> Result<TrackMetadata, DownloadError> {
        self.track(reference).await
    }

    pub async fn title(&self, reference: &Reference) -> Result<String, DownloadError> {
        Ok(self.details(reference).await?.title)
    }

    /// Formatted duration; `None` for live streams
    pub async fn duration(&self, reference: &Reference) -> Result<Option<String>, DownloadError> {
        Ok(self.details(reference).await?.duration_text)
    }

    pub async fn thumbnail(&self, reference: &Reference) -> Result<String, DownloadError> {
        Ok(self.details(reference).await?.thumbnail)
    }

    pub async fn video_id(&self, reference: &Reference) -> Result<String, DownloadError> {
        Ok(self.details(reference).await?.video_id)
    }

    /// Whether the reference names an existing video. False when no id can
    /// be extracted or the API cannot answer.
    pub async fn exists(&self, reference: &Reference) -> bool {
        let Some(id) = reference.video_id() else {
            return false;
        };
        if self.primary_disabled() {
            return false;
        }

        let answer = self
            .existence
            .get_or_load(reference.clone(), || async {
                match self.primary.exists(&id).await {
                    Ok(found) => Ok::<_, Infallible>(Some(found)),
                    Err(e) => {
                        self.record_api_error("exists", &e);
                        Ok(None)
                    }
                }
            })
            .await;
        matches!(answer, Ok(Some(true)))
    }

    /// API search; empty when the API cannot answer.
    pub async fn search(&self, query: &str, max_results: u32) -> Vec<SearchResult> {
        if self.primary_disabled() {
            return Vec::new();
        }
        match self.primary.search(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                self.record_api_error("search", &e);
                Vec::new()
            }
        }
    }

    /// Entry `index` of a ten-result search, for paging through choices.
    pub async fn slider(&self, query: &str, index: usize) -> Option<TrackMetadata> {
        let loaded = self
            .sliders
            .get_or_load((query.to_string(), index), || async {
                let results = self.search(query, SLIDER_RESULTS).await;
                Ok::<_, Infallible>(results.into_iter().nth(index).map(SearchResult::into_metadata))
            })
            .await;
        loaded.ok().flatten()
    }

    /// Ordered video ids of a playlist, at most `limit` (and never more
    /// than 50). Empty when the API cannot answer.
    pub async fn playlist(&self, reference: &Reference, limit: u32) -> Vec<String> {
        let Some(playlist_id) = reference.playlist_id() else {
            return Vec::new();
        };
        if self.primary_disabled() {
            return Vec::new();
        }

        let loaded = self
            .playlists
            .get_or_load((reference.clone(), limit), || async {
                match self.primary.playlist_items(&playlist_id, limit).await {
                    Ok(ids) => Ok::<_, Infallible>(Some(ids)),
                    Err(e) => {
                        self.record_api_error("playlist", &e);
                        Ok(None)
                    }
                }
            })
            .await;
        loaded.ok().flatten().unwrap_or_default()
    }

    /// Downloadable formats and the link they were listed for.
    pub async fn formats(
        &self,
        reference: &Reference,
    ) -> Result<(Vec<FormatDescriptor>, String), DownloadError> {
        let loaded = self
            .formats
            .get_or_load(reference.clone(), || async {
                let link = reference.link();
                let raw = self.extractor.formats(&link).await?;
                debug!("[YouTubeService] {} raw formats for {}", raw.len(), link);
                let usable = FormatSelector::usable_formats(raw, &link);
                Ok::<_, DownloadError>(Some((usable, link)))
            })
            .await?;
        loaded.ok_or_else(|| DownloadError::NoResults(reference.as_str().to_string()))
    }

    /// Direct stream URL of a single progressive stream
    pub async fn stream_url(&self, reference: &Reference) -> Result<String, DownloadError> {
        let link = reference.link();
        self.extractor
            .direct_url(&link, STREAM_FORMAT)
            .await?
            .ok_or(DownloadError::NoResults(link))
    }

    pub async fn download(
        &self,
        reference: &Reference,
        mode: &DownloadMode,
    ) -> Result<DownloadResult, DownloadError> {
        self.orchestrator.download(reference, mode).await
    }

    /// Link embedded in a chat message or the message it replies to
    pub async fn url(&self, message: &Message) -> Option<String> {
        extract_link_from_message(message).await
    }
}
