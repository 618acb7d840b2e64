//! AllManga and AniZone content sources for a media-aggregation host.

pub mod config;
pub mod extract;
pub mod filters;
pub mod hls;
pub mod http;
pub mod player;
pub mod providers;
pub mod scrape;
pub mod types;
