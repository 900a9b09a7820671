// CLI extractor - drives the native `yt-dlp` binary
//
// Used for the fallback search, format listing, direct stream URLs and every
// download profile. Each call is a fresh process with its own deadline.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::traits::{DownloadProfile, ExtractorConfig, RawFormat, TrackExtractor};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::TrackMetadata;
use crate::downloader::traits::{CookieProvider, StaticCookies};
use crate::downloader::utils::run_output_with_timeout;

/// stderr noise yt-dlp prints for playlists with hidden entries; not a failure
const HIDDEN_VIDEOS_NOTICE: &str = "unavailable videos are hidden";

/// yt-dlp backed extractor
pub struct CliExtractor {
    config: ExtractorConfig,
    cookies: Arc<dyn CookieProvider>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    entries: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FormatPage {
    #[serde(default)]
    formats: Vec<RawFormat>,
}

impl CliExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            cookies: Arc::new(StaticCookies::default()),
        }
    }

    pub fn with_cookies(mut self, cookies: Arc<dyn CookieProvider>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Flags shared by every invocation: cookies, proxy, socket timeout
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "15".to_string(),
        ];

        if let Some(client) = &self.config.player_client {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", client));
        }

        if let Some(path) = self.cookies.cookie_file() {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }

    fn search_args(&self, query: &str) -> Vec<String> {
        let mut args = vec!["--flat-playlist".to_string(), "-J".to_string()];
        args.extend(self.common_args());
        args.push(format!("ytsearch1:{}", query));
        args
    }

    fn formats_args(&self, link: &str) -> Vec<String> {
        let mut args = vec!["-J".to_string(), "--no-playlist".to_string()];
        args.extend(self.common_args());
        args.push(link.to_string());
        args
    }

    fn direct_url_args(&self, link: &str, format: &str) -> Vec<String> {
        let mut args = vec!["-g".to_string(), "-f".to_string(), format.to_string()];
        args.extend(self.common_args());
        args.push(link.to_string());
        args
    }

    fn download_args(&self, link: &str, profile: &DownloadProfile) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            profile.format.clone(),
            "-o".to_string(),
            profile.output_template.to_string_lossy().to_string(),
            "--no-playlist".to_string(),
            "--geo-bypass".to_string(),
            "--no-check-certificates".to_string(),
            "--quiet".to_string(),
            "--prefer-ffmpeg".to_string(),
        ];
        args.extend(profile.extra_args.iter().cloned());
        args.extend(self.common_args());
        args.push(link.to_string());
        args
    }

    /// Run yt-dlp; nonzero exit is an error unless it only complained about
    /// hidden playlist entries.
    async fn run(&self, args: Vec<String>, timeout_secs: u64) -> Result<Vec<u8>, DownloadError> {
        debug!(
            "[CliExtractor] {} {}",
            self.config.ytdlp_path,
            args.join(" ")
        );

        let out = run_output_with_timeout(&self.config.ytdlp_path, &args, timeout_secs).await?;
        if out.status.success() {
            return Ok(out.stdout);
        }

        let stderr = String::from_utf8_lossy(&out.stderr);
        if stderr.to_lowercase().contains(HIDDEN_VIDEOS_NOTICE) && !out.stdout.is_empty() {
            return Ok(out.stdout);
        }

        warn!("[CliExtractor] yt-dlp failed ({}): {}", out.status, stderr.trim());
        let err = DownloadError::from_stderr(&stderr);
        if err.needs_fresh_cookies() {
            match self.cookies.cookie_file() {
                Some(path) => warn!("[CliExtractor] Cookie file {} may be stale", path.display()),
                None => warn!("[CliExtractor] No cookie file configured; one may be required"),
            }
        } else if err.is_permanent() {
            debug!("[CliExtractor] {} is not retryable", err);
        }
        Err(err)
    }

    fn parse_search(stdout: &[u8], query: &str) -> Result<TrackMetadata, DownloadError> {
        let page: SearchPage = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let entry = page
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| DownloadError::NoResults(query.to_string()))?;

        // Flat entries report live streams with a null or zero duration
        let duration_secs = entry.duration.unwrap_or(0.0).max(0.0) as u64;
        let link = entry
            .url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id));
        let thumbnail = entry
            .thumbnails
            .into_iter()
            .next()
            .map(|t| t.url)
            .unwrap_or_default();

        Ok(TrackMetadata::new(
            entry.title.unwrap_or_else(|| "Unknown".to_string()),
            duration_secs,
            thumbnail,
            entry.id,
            link,
        ))
    }

    fn parse_formats(stdout: &[u8]) -> Result<Vec<RawFormat>, DownloadError> {
        let page: FormatPage = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;
        Ok(page.formats)
    }

    fn first_line(stdout: &[u8]) -> Option<String> {
        String::from_utf8_lossy(stdout)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl TrackExtractor for CliExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn search_first(&self, query: &str) -> Result<TrackMetadata, DownloadError> {
        let stdout = self
            .run(self.search_args(query), self.config.timeout_seconds)
            .await?;
        Self::parse_search(&stdout, query)
    }

    async fn formats(&self, link: &str) -> Result<Vec<RawFormat>, DownloadError> {
        let stdout = self
            .run(self.formats_args(link), self.config.timeout_seconds)
            .await?;
        Self::parse_formats(&stdout)
    }

    async fn video_id(&self, link: &str) -> Result<String, DownloadError> {
        let mut args = vec![
            "--print".to_string(),
            "id".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.common_args());
        args.push(link.to_string());

        let stdout = self.run(args, self.config.timeout_seconds).await?;
        Self::first_line(&stdout)
            .ok_or_else(|| DownloadError::ParseError(format!("no id printed for {}", link)))
    }

    async fn direct_url(&self, link: &str, format: &str) -> Result<Option<String>, DownloadError> {
        let args = self.direct_url_args(link, format);
        let out = run_output_with_timeout(
            &self.config.ytdlp_path,
            &args,
            self.config.direct_url_timeout_seconds,
        )
        .await?;

        let url = Self::first_line(&out.stdout);
        if url.is_none() && !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            debug!("[CliExtractor] no direct url for {}: {}", link, stderr.trim());
            return Err(DownloadError::from_stderr(&stderr));
        }
        Ok(url)
    }

    async fn download(&self, link: &str, profile: &DownloadProfile) -> Result<(), DownloadError> {
        self.run(
            self.download_args(link, profile),
            self.config.download_timeout_seconds,
        )
        .await?;
        Ok(())
    }
}
