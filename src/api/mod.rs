// YouTube Data API tier

mod client;
mod types;

pub use client::{parse_duration, YouTubeApi, MAX_PAGE_SIZE};
