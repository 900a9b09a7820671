// Extractor module - the local yt-dlp tier
//
// The API tier answers most metadata questions; this module is what runs
// when it cannot, and it performs every download.

mod cli;
mod diagnostics;
mod traits;

pub use cli::CliExtractor;
pub use diagnostics::{diagnose_error, summarize_stderr, BlockingReason};
pub use traits::{DownloadProfile, ExtractorConfig, RawFormat, TrackExtractor};
