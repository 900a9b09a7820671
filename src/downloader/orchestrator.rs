// Download orchestrator: one strategy per DownloadMode

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::errors::DownloadError;
use super::extractors::{DownloadProfile, TrackExtractor};
use super::models::{DownloadMode, DownloadResult};
use super::traits::FeatureFlags;
use crate::identifier::Reference;

/// `-f` selectors
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";
const VIDEO_FORMAT: &str = "(bestvideo[height<=?720][width<=?1280][ext=mp4])+(bestaudio[ext=m4a])";
const DIRECT_FORMAT: &str = "best";
/// Audio track muxed into fixed-format video downloads
const SONG_VIDEO_AUDIO_TRACK: &str = "140";

pub struct DownloadOrchestrator {
    extractor: Arc<dyn TrackExtractor>,
    flags: Arc<dyn FeatureFlags>,
    download_dir: PathBuf,
}

impl DownloadOrchestrator {
    pub fn new(
        extractor: Arc<dyn TrackExtractor>,
        flags: Arc<dyn FeatureFlags>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            flags,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Format selector, output paths and post-processing for one mode.
    /// The final path depends only on the video id and the mode.
    pub fn profile(&self, video_id: &str, mode: &DownloadMode) -> DownloadProfile {
        let (stem, ext, format, extra): (String, &str, String, &[&str]) = match mode {
            DownloadMode::Audio => (
                video_id.to_string(),
                "m4a",
                AUDIO_FORMAT.to_string(),
                &["-x", "--audio-format", "m4a"],
            ),
            DownloadMode::Video => (
                video_id.to_string(),
                "mp4",
                VIDEO_FORMAT.to_string(),
                &["--merge-output-format", "mp4"],
            ),
            DownloadMode::SongAudio { format_id } => (
                format!("{}_{}", video_id, format_id),
                "mp3",
                format_id.clone(),
                &["-x", "--audio-format", "mp3", "--audio-quality", "192K"],
            ),
            DownloadMode::SongVideo { format_id } => (
                format!("{}_{}", video_id, format_id),
                "mp4",
                format!("{}+{}", format_id, SONG_VIDEO_AUDIO_TRACK),
                &["--merge-output-format", "mp4"],
            ),
        };

        DownloadProfile {
            format,
            output_template: self.download_dir.join(format!("{}.%(ext)s", stem)),
            output_path: self.download_dir.join(format!("{}.{}", stem, ext)),
            extra_args: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Run the strategy for `mode`.
    ///
    /// Video requests with local downloads switched off first try to hand
    /// out a direct stream URL. Otherwise an existing output file is returned
    /// without touching yt-dlp.
    pub async fn download(
        &self,
        reference: &Reference,
        mode: &DownloadMode,
    ) -> Result<DownloadResult, DownloadError> {
        let (video_id, link) = self.resolve_target(reference).await?;
        let profile = self.profile(&video_id, mode);
        info!("[Downloader] {} download of {}", mode.name(), video_id);

        if *mode == DownloadMode::Video && !self.flags.local_video_download().await {
            match self.extractor.direct_url(&link, DIRECT_FORMAT).await {
                Ok(Some(url)) => {
                    info!("[Downloader] ✓ Direct link for {}", video_id);
                    return Ok(DownloadResult::direct(url));
                }
                Ok(None) => warn!("[Downloader] No direct link for {}, downloading", video_id),
                Err(e) => warn!("[Downloader] ✗ Direct link probe failed ({}), downloading", e),
            }
        }

        if tokio::fs::try_exists(&profile.output_path).await? {
            debug!("[Downloader] Already on disk: {}", profile.output_path.display());
            return Ok(DownloadResult::local(profile.output_path));
        }

        self.extractor.download(&link, &profile).await?;

        if !tokio::fs::try_exists(&profile.output_path).await? {
            return Err(DownloadError::OutputMissing(
                profile.output_path.to_string_lossy().to_string(),
            ));
        }
        info!("[Downloader] ✓ Saved {}", profile.output_path.display());
        Ok(DownloadResult::local(profile.output_path))
    }

    /// Canonical id and normalised link. Search text is resolved through
    /// the extractor's own search; links it cannot parse are probed.
    async fn resolve_target(&self, reference: &Reference) -> Result<(String, String), DownloadError> {
        if let Reference::Query(query) = reference {
            let track = self.extractor.search_first(query).await?;
            return Ok((track.video_id, track.link));
        }

        let link = reference.link();
        let video_id = match reference.video_id() {
            Some(id) => id,
            None => self.extractor.video_id(&link).await?,
        };
        Ok((video_id, link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::traits::StaticFlags;
    use crate::testing::{track, FakeExtractor};

    const ID: &str = "dQw4w9WgXcQ";

    fn orchestrator(
        extractor: Arc<FakeExtractor>,
        local_video: bool,
        dir: &Path,
    ) -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            extractor,
            Arc::new(StaticFlags {
                local_video_download: local_video,
            }),
            dir,
        )
    }

    #[test]
    fn test_profiles_are_deterministic() {
        let o = orchestrator(Arc::new(FakeExtractor::default()), false, Path::new("downloads"));

        let audio = o.profile(ID, &DownloadMode::Audio);
        assert_eq!(audio.output_path, PathBuf::from("downloads/dQw4w9WgXcQ.m4a"));
        assert_eq!(audio.format, AUDIO_FORMAT);

        let video = o.profile(ID, &DownloadMode::Video);
        assert_eq!(video.output_path, PathBuf::from("downloads/dQw4w9WgXcQ.mp4"));
        assert!(video.extra_args.contains(&"--merge-output-format".to_string()));

        let song_audio = o.profile(ID, &DownloadMode::SongAudio { format_id: "251".into() });
        assert_eq!(song_audio.output_path, PathBuf::from("downloads/dQw4w9WgXcQ_251.mp3"));
        assert_eq!(song_audio.output_template, PathBuf::from("downloads/dQw4w9WgXcQ_251.%(ext)s"));
        assert!(song_audio.extra_args.contains(&"192K".to_string()));

        let song_video = o.profile(ID, &DownloadMode::SongVideo { format_id: "137".into() });
        assert_eq!(song_video.output_path, PathBuf::from("downloads/dQw4w9WgXcQ_137.mp4"));
        assert_eq!(song_video.format, "137+140");
    }

    #[tokio::test]
    async fn test_existing_file_skips_tool() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let o = orchestrator(extractor.clone(), true, dir.path());

        let existing = dir.path().join("dQw4w9WgXcQ_251.mp3");
        std::fs::write(&existing, b"done").unwrap();

        let result = o
            .download(&Reference::Id(ID.into()), &DownloadMode::SongAudio { format_id: "251".into() })
            .await
            .unwrap();

        assert_eq!(result, DownloadResult::local(existing));
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 0);
        assert_eq!(FakeExtractor::calls(&extractor.id_calls), 0);
    }

    #[tokio::test]
    async fn test_audio_downloads_once() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let o = orchestrator(extractor.clone(), false, dir.path());
        let reference = Reference::classify("https://youtu.be/dQw4w9WgXcQ?t=10");

        let first = o.download(&reference, &DownloadMode::Audio).await.unwrap();
        let second = o.download(&reference, &DownloadMode::Audio).await.unwrap();

        assert_eq!(first, second);
        assert!(!first.is_direct_link);
        assert!(first.location.ends_with("dQw4w9WgXcQ.m4a"));
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 1);
        assert_eq!(FakeExtractor::calls(&extractor.direct_calls), 0);
    }

    #[tokio::test]
    async fn test_video_direct_link_when_flag_off() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            direct: Some("https://rr1.googlevideo.com/videoplayback?id=1".into()),
            ..FakeExtractor::default()
        });
        let o = orchestrator(extractor.clone(), false, dir.path());

        let result = o.download(&Reference::Id(ID.into()), &DownloadMode::Video).await.unwrap();

        assert_eq!(result, DownloadResult::direct("https://rr1.googlevideo.com/videoplayback?id=1"));
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 0);
    }

    #[tokio::test]
    async fn test_video_direct_link_wins_over_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.mp4"), b"old").unwrap();
        let extractor = Arc::new(FakeExtractor {
            direct: Some("https://rr1.googlevideo.com/v".into()),
            ..FakeExtractor::default()
        });
        let o = orchestrator(extractor.clone(), false, dir.path());

        let result = o.download(&Reference::Id(ID.into()), &DownloadMode::Video).await.unwrap();

        assert_eq!(result, DownloadResult::direct("https://rr1.googlevideo.com/v"));
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 0);
    }

    #[tokio::test]
    async fn test_video_without_direct_link_reuses_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("dQw4w9WgXcQ.mp4");
        std::fs::write(&existing, b"old").unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let o = orchestrator(extractor.clone(), false, dir.path());

        let result = o.download(&Reference::Id(ID.into()), &DownloadMode::Video).await.unwrap();

        assert_eq!(result, DownloadResult::local(existing));
        assert_eq!(FakeExtractor::calls(&extractor.direct_calls), 1);
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 0);
    }

    #[tokio::test]
    async fn test_video_falls_back_to_download_without_direct_link() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor::default());
        let o = orchestrator(extractor.clone(), false, dir.path());

        let result = o.download(&Reference::Id(ID.into()), &DownloadMode::Video).await.unwrap();

        assert!(!result.is_direct_link);
        assert_eq!(FakeExtractor::calls(&extractor.direct_calls), 1);
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 1);
    }

    #[tokio::test]
    async fn test_video_flag_on_always_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            direct: Some("https://rr1.googlevideo.com/videoplayback?id=1".into()),
            ..FakeExtractor::default()
        });
        let o = orchestrator(extractor.clone(), true, dir.path());

        let result = o.download(&Reference::Id(ID.into()), &DownloadMode::Video).await.unwrap();

        assert_eq!(result, DownloadResult::local(dir.path().join("dQw4w9WgXcQ.mp4")));
        assert_eq!(FakeExtractor::calls(&extractor.direct_calls), 0);
        assert_eq!(FakeExtractor::calls(&extractor.downloads), 1);
        let profile = extractor.last_profile.lock().unwrap().clone().unwrap();
        assert_eq!(profile.format, VIDEO_FORMAT);
    }

    #[tokio::test]
    async fn test_query_resolves_through_extractor_search() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            track: Some(track("aaaaaaaaaaa", "Song", 200)),
            ..FakeExtractor::default()
        });
        let o = orchestrator(extractor.clone(), true, dir.path());

        let result = o
            .download(&Reference::Query("some song".into()), &DownloadMode::Audio)
            .await
            .unwrap();

        assert!(result.location.ends_with("aaaaaaaaaaa.m4a"));
        assert_eq!(FakeExtractor::calls(&extractor.searches), 1);
    }

    #[tokio::test]
    async fn test_unparseable_link_asks_extractor_for_id() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(FakeExtractor {
            id: Some("bbbbbbbbbbb".into()),
            ..FakeExtractor::default()
        });
        let o = orchestrator(extractor.clone(), true, dir.path());

        let result = o
            .download(
                &Reference::Url("https://www.youtube.com/shorts/bbbbbbbbbbb".into()),
                &DownloadMode::Audio,
            )
            .await
            .unwrap();

        assert!(result.location.ends_with("bbbbbbbbbbb.m4a"));
        assert_eq!(FakeExtractor::calls(&extractor.id_calls), 1);
    }
}
