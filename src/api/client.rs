// YouTube Data API v3 client - the primary metadata tier
//
// Only three endpoints are used: videos (lookup / existence), search and
// playlistItems. Every response is either an answer, "nothing there", or an
// ApiError the service turns into a fallback.

use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    ErrorEnvelope, ListResponse, PlaylistItem, SearchItem, VideoItem,
};
use crate::config::ApiConfig;
use crate::downloader::errors::ApiError;
use crate::downloader::models::{SearchResult, TrackMetadata};
use crate::downloader::traits::MetadataSource;
use crate::downloader::utils::format_duration;
use crate::identifier::WATCH_BASE;

/// playlistItems refuses larger pages
pub const MAX_PAGE_SIZE: u32 = 50;

lazy_static! {
    static ref ISO_DURATION_RE: Regex =
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap();
}

/// Seconds in the `PT#H#M#S` subset of ISO-8601. Missing parts count as zero;
/// anything else, including values that overflow, parses to zero.
pub fn parse_duration(iso: &str) -> u64 {
    let Some(caps) = ISO_DURATION_RE.captures(iso) else {
        return 0;
    };
    let part = |i: usize| match caps.get(i) {
        Some(m) => m.as_str().parse::<u64>().ok(),
        None => Some(0),
    };
    let total = || -> Option<u64> {
        part(1)?
            .checked_mul(3600)?
            .checked_add(part(2)?.checked_mul(60)?)?
            .checked_add(part(3)?)
    };
    total().unwrap_or(0)
}

/// HTTP client for the Data API
pub struct YouTubeApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl YouTubeApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(proxy) = config.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let key = self.config.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!("[YouTubeApi] GET {} {:?}", endpoint, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.reason())
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            warn!("[YouTubeApi] {} returned {}: {}", endpoint, status, reason);
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{}: {}", endpoint, e)))
    }

    async fn videos(&self, ids: &[String], part: &str) -> Result<Vec<VideoItem>, ApiError> {
        let response: ListResponse<VideoItem> = self
            .get("videos", &[("part", part.to_string()), ("id", ids.join(","))])
            .await?;
        Ok(response.items)
    }

    fn to_metadata(item: VideoItem) -> Result<TrackMetadata, ApiError> {
        let snippet = item
            .snippet
            .ok_or_else(|| ApiError::Decode(format!("video {} has no snippet", item.id)))?;
        let duration_secs = item
            .content_details
            .map(|c| parse_duration(&c.duration))
            .unwrap_or(0);

        Ok(TrackMetadata::new(
            snippet.title,
            duration_secs,
            snippet.thumbnails.best_url(),
            item.id.clone(),
            format!("{}{}", WATCH_BASE, item.id),
        ))
    }
}

#[async_trait]
impl MetadataSource for YouTubeApi {
    fn name(&self) -> &'static str {
        "youtube-data-api"
    }

    async fn lookup(&self, video_id: &str) -> Result<Option<TrackMetadata>, ApiError> {
        let items = self
            .videos(&[video_id.to_string()], "snippet,contentDetails")
            .await?;
        items.into_iter().next().map(Self::to_metadata).transpose()
    }

    async fn exists(&self, video_id: &str) -> Result<bool, ApiError> {
        let items = self.videos(&[video_id.to_string()], "id").await?;
        Ok(!items.is_empty())
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ApiError> {
        let response: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("q", query.to_string()),
                    ("type", "video".to_string()),
                    ("maxResults", max_results.min(MAX_PAGE_SIZE).to_string()),
                    ("order", "relevance".to_string()),
                ],
            )
            .await?;

        let hits: Vec<(String, _)> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id.map(|id| (id, item.snippet)))
            .collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        // One batched lookup for every duration
        let ids: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let durations: HashMap<String, u64> = match self.videos(&ids, "contentDetails").await {
            Ok(items) => items
                .into_iter()
                .map(|v| {
                    let secs = v.content_details.map(|c| parse_duration(&c.duration)).unwrap_or(0);
                    (v.id, secs)
                })
                .collect(),
            Err(e) => {
                warn!("[YouTubeApi] duration lookup failed, durations unknown: {}", e);
                HashMap::new()
            }
        };

        Ok(hits
            .into_iter()
            .map(|(id, snippet)| {
                let duration_secs = durations.get(&id).copied().unwrap_or(0);
                SearchResult {
                    link: format!("{}{}", WATCH_BASE, id),
                    thumbnail: snippet.thumbnails.best_url(),
                    duration_text: format_duration(duration_secs),
                    duration_secs,
                    channel: snippet.channel_title,
                    title: snippet.title,
                    id,
                }
            })
            .collect())
    }

    async fn playlist_items(&self, playlist_id: &str, limit: u32) -> Result<Vec<String>, ApiError> {
        let page_size = limit.min(MAX_PAGE_SIZE);
        if page_size == 0 {
            return Ok(Vec::new());
        }

        let response: ListResponse<PlaylistItem> = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet".to_string()),
                    ("playlistId", playlist_id.to_string()),
                    ("maxResults", page_size.to_string()),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.video_id)
            .take(page_size as usize)
            .collect())
    }
}
