// Identifier parsing - user references into video and playlist ids

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Watch URL prefix; a bare id is appended to it
pub const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

lazy_static::lazy_static! {
    static ref VIDEO_ID_PATTERNS: [Regex; 3] = [
        Regex::new(r"[?&]v=([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"/embed/([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").unwrap(),
    ];
    static ref PLAYLIST_RE: Regex = Regex::new(r"list=([a-zA-Z0-9_-]+)").unwrap();
    static ref YOUTUBE_HOST_RE: Regex = Regex::new(r"(?:youtube\.com|youtu\.be)").unwrap();
}

/// Video id from a watch, embed or short link. Patterns are tried in that
/// order and the first match wins.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Playlist id from a `list=` query parameter
pub fn extract_playlist_id(url: &str) -> Option<String> {
    PLAYLIST_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_youtube_link(text: &str) -> bool {
    YOUTUBE_HOST_RE.is_match(text)
}

/// What the user handed us.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// Something that looks like a YouTube link
    Url(String),
    /// A bare video (or playlist) id
    Id(String),
    /// Free text to search for
    Query(String),
}

impl Reference {
    /// Decide between link and search text.
    pub fn classify(input: &str) -> Self {
        let input = input.trim();
        if is_youtube_link(input) || extract_video_id(input).is_some() {
            Self::Url(input.to_string())
        } else {
            Self::Query(input.to_string())
        }
    }

    /// The `(link, is_id)` calling convention of the command layer.
    pub fn from_flag(input: &str, is_id: bool) -> Self {
        if is_id {
            Self::Id(input.trim().to_string())
        } else {
            Self::classify(input)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Id(s) | Self::Query(s) => s,
        }
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Self::Id(_))
    }

    /// Video id, when one is known without a network call
    pub fn video_id(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Url(url) => extract_video_id(url),
            Self::Query(_) => None,
        }
    }

    pub fn playlist_id(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Url(url) => extract_playlist_id(url),
            Self::Query(_) => None,
        }
    }

    /// Link suitable for yt-dlp: ids become watch URLs, and extra query
    /// parameters (playlist, timestamp) are dropped.
    pub fn link(&self) -> String {
        match self {
            Self::Id(id) => format!("{}{}", WATCH_BASE, id),
            Self::Url(url) => match extract_video_id(url) {
                Some(id) => format!("{}{}", WATCH_BASE, id),
                None => url.split('&').next().unwrap_or(url).to_string(),
            },
            Self::Query(q) => q.clone(),
        }
    }
}
