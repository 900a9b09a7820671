// Extraction diagnostics - classifies yt-dlp failures
//
// The extractor tier is terminal, so the host only gets one chance to show a
// useful message. Stderr is reduced to a BlockingReason plus the first line
// that actually explains the failure.

use serde::{Deserialize, Serialize};

/// Reasons why yt-dlp refused or failed to extract a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// Cookie file rejected or expired ("cookies are no longer valid")
    CookiesRejected,

    /// "Sign in to confirm you're not a bot" and friends
    BotDetection,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Geographic restriction
    GeoBlocked,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Network timeout (soft IP block)
    NetworkTimeout,

    /// Generic/unknown failure
    Unknown,
}

impl BlockingReason {
    /// Check if fresh cookies might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::CookiesRejected
                | Self::BotDetection
                | Self::AgeRestricted
                | Self::PrivateVideo
                | Self::Http403Forbidden
        )
    }

    /// Check if this is a permanent restriction (no workaround)
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::VideoUnavailable | Self::PrivateVideo)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::CookiesRejected => "Cookies were rejected",
            Self::BotDetection => "Bot detection triggered",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
            Self::RateLimited => "Rate limited by YouTube",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::NetworkTimeout => "Network timeout",
            Self::Unknown => "Unknown extraction failure",
        }
    }
}

/// Analyze yt-dlp stderr and return the blocking reason, if any
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Cookie problems first: they also mention "sign in"
    if lower.contains("cookies are no longer valid")
        || lower.contains("invalid cookie")
        || lower.contains("cookiefile")
        || lower.contains("netscape format cookies")
    {
        return Some(BlockingReason::CookiesRejected);
    }

    if lower.contains("confirm you're not a bot")
        || lower.contains("confirm you’re not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("this video is no longer available")
        || lower.contains("video is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restriction")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

/// Pick the stderr line worth showing: the first `ERROR:` line, otherwise the
/// last non-empty line, capped at 200 chars.
pub fn summarize_stderr(stderr: &str) -> String {
    let line = stderr
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("no output");

    line.chars().take(200).collect()
}
