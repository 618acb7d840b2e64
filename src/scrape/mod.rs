//! HTML scrapers for AllManga listing and detail pages.

pub mod detail;
pub mod listing;
pub mod strategy;

pub use detail::parse_detail;
pub use listing::parse_listing;
