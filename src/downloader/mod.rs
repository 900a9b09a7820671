// Downloader module - extraction tier, formats and download strategies

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod utils;

pub use errors::{ApiError, DownloadError};
pub use extractors::{BlockingReason, CliExtractor, ExtractorConfig, TrackExtractor};
pub use format_selector::FormatSelector;
pub use models::{DownloadMode, DownloadResult, FormatDescriptor, SearchResult, TrackMetadata};
pub use orchestrator::DownloadOrchestrator;
pub use traits::{CookieProvider, FeatureFlags, MetadataSource, StaticCookies, StaticFlags};
