// Counting fakes for the metadata and extraction seams

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::downloader::errors::{ApiError, DownloadError};
use crate::downloader::extractors::{DownloadProfile, RawFormat, TrackExtractor};
use crate::downloader::models::{SearchResult, TrackMetadata};
use crate::downloader::traits::MetadataSource;
use crate::identifier::WATCH_BASE;

pub fn track(id: &str, title: &str, secs: u64) -> TrackMetadata {
    TrackMetadata::new(
        title,
        secs,
        format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
        id,
        format!("{}{}", WATCH_BASE, id),
    )
}

pub fn hit(id: &str, title: &str, secs: u64) -> SearchResult {
    let t = track(id, title, secs);
    SearchResult {
        id: t.video_id,
        title: t.title,
        link: t.link,
        thumbnail: t.thumbnail,
        duration_text: t.duration_text,
        duration_secs: t.duration_secs,
        channel: "channel".to_string(),
    }
}

fn count(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Primary tier answering from fixed data, or failing with `fail_status`.
#[derive(Default)]
pub struct FakeSource {
    pub tracks: HashMap<String, TrackMetadata>,
    pub results: Vec<SearchResult>,
    pub playlist: Vec<String>,
    pub fail_status: Option<u16>,
    pub lookups: AtomicUsize,
    pub searches: AtomicUsize,
    pub playlist_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_track(mut self, track: TrackMetadata) -> Self {
        self.tracks.insert(track.video_id.clone(), track);
        self
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), ApiError> {
        match self.fail_status {
            Some(status) => Err(ApiError::Status {
                status,
                reason: "fake".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake-source"
    }

    async fn lookup(&self, video_id: &str) -> Result<Option<TrackMetadata>, ApiError> {
        count(&self.lookups);
        self.check()?;
        Ok(self.tracks.get(video_id).cloned())
    }

    async fn exists(&self, video_id: &str) -> Result<bool, ApiError> {
        count(&self.lookups);
        self.check()?;
        Ok(self.tracks.contains_key(video_id))
    }

    async fn search(&self, _query: &str, max_results: u32) -> Result<Vec<SearchResult>, ApiError> {
        count(&self.searches);
        self.check()?;
        Ok(self.results.iter().take(max_results as usize).cloned().collect())
    }

    async fn playlist_items(&self, _playlist_id: &str, limit: u32) -> Result<Vec<String>, ApiError> {
        count(&self.playlist_calls);
        self.check()?;
        Ok(self.playlist.iter().take(limit.min(50) as usize).cloned().collect())
    }
}

/// Extractor that never spawns anything; `download` touches the output file.
#[derive(Default)]
pub struct FakeExtractor {
    pub track: Option<TrackMetadata>,
    pub formats: Vec<RawFormat>,
    pub id: Option<String>,
    pub direct: Option<String>,
    pub searches: AtomicUsize,
    pub format_calls: AtomicUsize,
    pub id_calls: AtomicUsize,
    pub direct_calls: AtomicUsize,
    pub downloads: AtomicUsize,
    pub last_profile: Mutex<Option<DownloadProfile>>,
}

impl FakeExtractor {
    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackExtractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake-extractor"
    }

    async fn search_first(&self, query: &str) -> Result<TrackMetadata, DownloadError> {
        count(&self.searches);
        self.track
            .clone()
            .ok_or_else(|| DownloadError::NoResults(query.to_string()))
    }

    async fn formats(&self, _link: &str) -> Result<Vec<RawFormat>, DownloadError> {
        count(&self.format_calls);
        Ok(self.formats.clone())
    }

    async fn video_id(&self, link: &str) -> Result<String, DownloadError> {
        count(&self.id_calls);
        self.id
            .clone()
            .ok_or_else(|| DownloadError::ExecutionError(format!("no id for {}", link)))
    }

    async fn direct_url(&self, _link: &str, _format: &str) -> Result<Option<String>, DownloadError> {
        count(&self.direct_calls);
        Ok(self.direct.clone())
    }

    async fn download(&self, _link: &str, profile: &DownloadProfile) -> Result<(), DownloadError> {
        count(&self.downloads);
        if let Some(parent) = profile.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&profile.output_path, b"media").await?;
        *self.last_profile.lock().unwrap() = Some(profile.clone());
        Ok(())
    }
}
