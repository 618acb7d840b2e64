//! AniZone provider: Jikan metadata plus AniZone stream descriptions.
//!
//! Unlike the AllManga source this provider never returns an error to its
//! caller. Failed requests are logged and come back as empty results.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, warn};

use super::jikan::{AnimeDetails, AnimeSummary, EpisodeInfo, JikanClient};
use crate::config::AniZoneSettings;
use crate::hls::{self, AUTO, StreamVariant, Variants};
use crate::http::USER_AGENT;

pub const PROVIDER_NAME: &str = "AniZone";
pub const SUPPORTED_QUALITIES: &[&str] = &["auto", "1080p", "720p", "480p", "360p"];
/// Extracted stream URLs typically stop working within a day.
const STREAM_TTL_HOURS: i64 = 24;

static SLUG_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid regex"));
static SLUG_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static SLUG_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub source: String,
    pub slug: String,
    pub episode_number: u32,
    pub episode_url: String,
    pub streams: BTreeMap<String, Option<StreamVariant>>,
    pub headers: HashMap<String, String>,
    pub extracted: bool,
    pub extracted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeData {
    pub anime: Option<AnimeDetails>,
    pub episode: u32,
    pub video_source: Option<StreamInfo>,
    pub provider: String,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
    slug: &'a str,
    episode: u32,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    streams: Vec<String>,
    #[serde(rename = "extractedAt")]
    #[serde(default, deserialize_with = "lenient_timestamp")]
    extracted_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 strings or epoch seconds; anything else becomes `None`
/// instead of failing the whole response.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(serde_json::Value::Number(secs)) => {
            secs.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
        _ => None,
    })
}

pub struct AniZoneProvider {
    jikan: JikanClient,
    client: Client,
    settings: AniZoneSettings,
}

impl AniZoneProvider {
    pub fn new(settings: AniZoneSettings) -> Result<Self> {
        let jikan = JikanClient::new(&settings.api_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            jikan,
            client,
            settings,
        })
    }

    fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    pub async fn search(&self, query: &str) -> Vec<AnimeSummary> {
        self.jikan.search(query).await.unwrap_or_else(|err| {
            error!("Error searching anime: {err:#}");
            Vec::new()
        })
    }

    pub async fn details(&self, mal_id: u64) -> Option<AnimeDetails> {
        self.jikan
            .details(mal_id)
            .await
            .inspect_err(|err| error!("Error getting anime details: {err:#}"))
            .ok()
    }

    pub async fn episodes(&self, mal_id: u64) -> Vec<EpisodeInfo> {
        self.jikan.episodes(mal_id).await.unwrap_or_else(|err| {
            error!("Error getting episodes: {err:#}");
            Vec::new()
        })
    }

    /// Stream info for an episode. Without an extraction backend this is a
    /// placeholder whose streams are all empty.
    pub async fn video_source(&self, title: &str, episode: u32) -> Option<StreamInfo> {
        let placeholder = self.placeholder_stream(title, episode);
        let Some(backend) = self.settings.backend_url() else {
            return Some(placeholder);
        };
        self.extract_with_backend(backend, placeholder)
            .await
            .inspect_err(|err| error!("Error extracting stream: {err:#}"))
            .ok()
    }

    /// Search, take the best match, then fetch its details and video source.
    pub async fn episode_data(&self, query: &str, episode: u32) -> Option<EpisodeData> {
        let results = self.search(query).await;
        let Some(anime) = results.first() else {
            warn!("No anime found for query: {query}");
            return None;
        };
        let details = self.details(anime.id).await;
        let video_source = self.video_source(&anime.title, episode).await;
        Some(EpisodeData {
            anime: details,
            episode,
            video_source,
            provider: PROVIDER_NAME.to_string(),
        })
    }

    /// Quality variants of an HLS master playlist, or a single `auto` entry
    /// for the manifest itself when it cannot be fetched or parsed.
    pub async fn variants(&self, manifest_url: &str) -> Variants {
        match self.fetch_variants(manifest_url).await {
            Ok(variants) => variants,
            Err(err) => {
                error!("Error parsing M3U8 playlist: {err:#}");
                hls::fallback_variants(manifest_url)
            }
        }
    }

    async fn fetch_variants(&self, manifest_url: &str) -> Result<Variants> {
        let response = self.client.get(manifest_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("manifest HTTP {status}");
        }
        let text = response.text().await?;
        Ok(hls::parse_master_playlist(&text, manifest_url)?)
    }

    fn placeholder_stream(&self, title: &str, episode: u32) -> StreamInfo {
        let slug = title_to_slug(title);
        let base = self.base_url();
        StreamInfo {
            source: PROVIDER_NAME.to_string(),
            episode_url: format!("{base}/anime/{slug}/episode-{episode}"),
            slug,
            episode_number: episode,
            streams: SUPPORTED_QUALITIES
                .iter()
                .map(|q| (q.to_string(), None))
                .collect(),
            headers: HashMap::from([
                ("Referer".to_string(), format!("{base}/")),
                ("Origin".to_string(), base.to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ]),
            extracted: false,
            extracted_at: None,
            expires_at: None,
        }
    }

    async fn extract_with_backend(&self, backend: &str, mut info: StreamInfo) -> Result<StreamInfo> {
        let url = format!("{backend}/extract");
        debug!(%url, episode_url = %info.episode_url, "requesting stream extraction");
        let response = self
            .client
            .post(&url)
            .json(&ExtractRequest {
                url: &info.episode_url,
                slug: &info.slug,
                episode: info.episode_number,
            })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Backend error: {status}");
        }
        let payload: ExtractResponse = response
            .json()
            .await
            .context("failed to parse backend response")?;
        let Some(stream_url) = payload.streams.first() else {
            bail!("backend returned no streams");
        };

        let variants = if stream_url.contains(".m3u8") {
            self.variants(stream_url).await
        } else {
            Variants::from([(
                AUTO.to_string(),
                StreamVariant {
                    url: stream_url.clone(),
                    resolution: "unknown".to_string(),
                    bandwidth: None,
                },
            )])
        };

        info.streams = variants.into_iter().map(|(k, v)| (k, Some(v))).collect();
        info.extracted = true;
        info.extracted_at = payload.extracted_at;
        info.expires_at = Some(Utc::now() + Duration::hours(STREAM_TTL_HOURS));
        Ok(info)
    }
}

/// URL slug AniZone uses for a title.
pub fn title_to_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lowered, "");
    let dashed = SLUG_SPACE_RE.replace_all(&stripped, "-");
    SLUG_DASH_RE.replace_all(&dashed, "-").trim().to_string()
}
