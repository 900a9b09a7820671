// Service configuration - structs with defaults, builders and env loading

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CachePolicy;
use crate::downloader::extractors::ExtractorConfig;
use crate::downloader::utils::find_ytdlp;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Without a key the API tier is skipped and everything goes to yt-dlp
    pub api_key: Option<String>,
    pub base_url: String,
    /// Per-request deadline
    pub timeout: Duration,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

impl ApiConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Everything a [`crate::YouTubeService`] needs
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub extractor: ExtractorConfig,
    /// Root of every local download
    pub download_dir: PathBuf,
    /// Cookie file handed to yt-dlp
    pub cookies_path: Option<PathBuf>,
    pub cache: CachePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            extractor: ExtractorConfig::default(),
            download_dir: PathBuf::from("downloads"),
            cookies_path: None,
            cache: CachePolicy::unbounded(),
        }
    }
}

impl ServiceConfig {
    /// Read `YOUTUBE_API_KEY`, `YOUTUBE_API_BASE_URL`, `YTDLP_PATH`,
    /// `YTDLP_COOKIES`, `YTDLP_PROXY` and `DOWNLOAD_DIR`; unset or empty
    /// variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = var("YOUTUBE_API_KEY") {
            config.api = config.api.with_api_key(key);
        }
        if let Some(url) = var("YOUTUBE_API_BASE_URL") {
            config.api = config.api.with_base_url(url);
        }

        let ytdlp = var("YTDLP_PATH").unwrap_or_else(find_ytdlp);
        config.extractor = config.extractor.with_ytdlp_path(ytdlp);

        let proxy = var("YTDLP_PROXY");
        config.api = config.api.with_proxy(proxy.clone());
        config.extractor = config.extractor.with_proxy(proxy);

        config.cookies_path = var("YTDLP_COOKIES").map(PathBuf::from);
        if let Some(dir) = var("DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }
}
