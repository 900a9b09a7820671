// Common data models for resolution and download

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::utils::{format_duration, parse_duration_text};

/// Canonical metadata for one track.
///
/// Both the API tier and the extractor tier build this same struct, so callers
/// never need to know which one answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    /// `M:SS` / `H:MM:SS`; `None` for live streams or unknown length
    pub duration_text: Option<String>,
    pub duration_secs: u64,
    pub thumbnail: String,
    pub video_id: String,
    /// Link the track was resolved from (watch URL for search results)
    pub link: String,
}

impl TrackMetadata {
    /// Build metadata from a length in seconds; zero means live/unknown.
    pub fn new(
        title: impl Into<String>,
        duration_secs: u64,
        thumbnail: impl Into<String>,
        video_id: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            duration_text: format_duration(duration_secs),
            duration_secs,
            thumbnail: thumbnail.into(),
            video_id: video_id.into(),
            link: link.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.duration_text.is_none()
    }

    /// Seconds recovered from `duration_text`; always equals `duration_secs`.
    pub fn text_secs(&self) -> u64 {
        self.duration_text
            .as_deref()
            .map(parse_duration_text)
            .unwrap_or(0)
    }
}

/// One entry of an API search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub link: String,
    pub thumbnail: String,
    pub duration_text: Option<String>,
    pub duration_secs: u64,
    pub channel: String,
}

impl SearchResult {
    pub fn into_metadata(self) -> TrackMetadata {
        TrackMetadata {
            title: self.title,
            duration_text: self.duration_text,
            duration_secs: self.duration_secs,
            thumbnail: self.thumbnail,
            video_id: self.id,
            link: self.link,
        }
    }
}

/// A downloadable format, as listed by yt-dlp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// yt-dlp's human label, e.g. "251 - audio only (medium)"
    pub format: String,
    pub filesize: u64,
    pub format_id: String,
    pub ext: String,
    pub format_note: String,
    /// Link the formats were listed for
    pub yturl: String,
}

/// Outcome of a download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Local file path, or a remote stream URL when `is_direct_link`
    pub location: String,
    pub is_direct_link: bool,
}

impl DownloadResult {
    pub fn local(path: PathBuf) -> Self {
        Self {
            location: path.to_string_lossy().to_string(),
            is_direct_link: false,
        }
    }

    pub fn direct(url: impl Into<String>) -> Self {
        Self {
            location: url.into(),
            is_direct_link: true,
        }
    }
}

/// Which download strategy to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadMode {
    /// Best audio, remuxed to m4a
    Audio,
    /// Best video up to 720p/1280w merged with m4a audio
    Video,
    /// A chosen format transcoded to 192k mp3
    SongAudio { format_id: String },
    /// A chosen format muxed with audio track 140 into mp4
    SongVideo { format_id: String },
}

impl DownloadMode {
    /// Resolve caller flags in fixed priority order:
    /// song-video, song-audio, video, audio.
    ///
    /// Song modes need a format id; without one they are skipped.
    pub fn from_flags(
        video: bool,
        song_audio: bool,
        song_video: bool,
        format_id: Option<&str>,
    ) -> Self {
        match format_id {
            Some(id) if song_video => Self::SongVideo { format_id: id.to_string() },
            Some(id) if song_audio => Self::SongAudio { format_id: id.to_string() },
            _ if video => Self::Video,
            _ => Self::Audio,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::SongAudio { .. } => "song-audio",
            Self::SongVideo { .. } => "song-video",
        }
    }
}
