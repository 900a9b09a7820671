// FormatSelector - turns raw yt-dlp formats into downloadable choices
//
// A format is offered only when every field the song modes rely on is present
// and it is not a DASH-only stream.

use super::extractors::RawFormat;
use super::models::FormatDescriptor;

/// Marker yt-dlp puts in labels of adaptive-only streams
const ADAPTIVE_MARKER: &str = "dash";

/// Format selector
pub struct FormatSelector;

impl FormatSelector {
    /// Keep complete, non-adaptive formats in source order.
    pub fn usable_formats(formats: Vec<RawFormat>, link: &str) -> Vec<FormatDescriptor> {
        formats
            .into_iter()
            .filter_map(|f| Self::to_descriptor(f, link))
            .collect()
    }

    fn to_descriptor(raw: RawFormat, link: &str) -> Option<FormatDescriptor> {
        let format = raw.format?;
        if format.to_lowercase().contains(ADAPTIVE_MARKER) {
            return None;
        }

        Some(FormatDescriptor {
            format,
            // a null size counts as missing; song modes show the size up front
            filesize: raw.filesize?,
            format_id: raw.format_id?,
            ext: raw.ext?,
            format_note: raw.format_note?,
            yturl: link.to_string(),
        })
    }
}
