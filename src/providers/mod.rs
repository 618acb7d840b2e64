use anyhow::Result;

use crate::extract::ExtractError;
use crate::filters::{SelectFilter, SourcePreference};
use crate::types::{DetailRecord, PageResult, StreamCandidate};

pub mod allmanga;
pub mod anizone;
pub mod jikan;

/// The host's content-source contract.
#[allow(async_fn_in_trait)]
pub trait AnimeSource {
    async fn popular(&self, page: u32) -> Result<PageResult>;
    async fn latest_updates(&self, page: u32) -> Result<PageResult>;
    async fn search(&self, query: &str, page: u32, filters: &[SelectFilter])
    -> Result<PageResult>;
    async fn detail(&self, url: &str) -> Result<DetailRecord>;
    async fn video_list(&self, url: &str) -> Result<Vec<StreamCandidate>, ExtractError>;
    fn filter_list(&self) -> Vec<SelectFilter>;
    fn source_preferences(&self) -> Vec<SourcePreference>;
}
