// Response shapes of the YouTube Data API v3 endpoints we call

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<Snippet>,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
    /// ISO-8601, e.g. `PT4M13S`
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// maxres, then high, medium, default; empty when none exist
    pub fn best_url(&self) -> String {
        self.maxres
            .as_ref()
            .or(self.high.as_ref())
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchId,
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchId {
    /// Absent for channel and playlist hits
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub video_id: Option<String>,
}

/// `{"error": {"code": 403, "message": "...", "errors": [{"reason": "quotaExceeded"}]}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ErrorEnvelope {
    /// Machine reason if present (`quotaExceeded`, `keyInvalid`), else the message
    pub fn reason(&self) -> String {
        self.error
            .errors
            .iter()
            .map(|e| e.reason.as_str())
            .find(|r| !r.is_empty())
            .unwrap_or(&self.error.message)
            .to_string()
    }
}
