//! Jikan (unofficial MyAnimeList) API client.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const METADATA_SOURCE: &str = "Jikan (MyAnimeList)";
const SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSummary {
    pub id: u64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub synopsis: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub score: Option<f64>,
    pub year: Option<u32>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetails {
    #[serde(flatten)]
    pub summary: AnimeSummary,
    pub season: Option<String>,
    pub trailer_url: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub rating: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInfo {
    pub number: u32,
    pub title: Option<String>,
    pub title_japanese: Option<String>,
    pub title_romanji: Option<String>,
    pub aired: Option<String>,
    pub score: Option<f64>,
    pub filler: bool,
    pub recap: bool,
}

pub struct JikanClient {
    client: Client,
    api_url: String,
}

impl JikanClient {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("anisrc/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%url, "querying Jikan");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Jikan API error: {status}");
        }
        let text = response.text().await?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse Jikan response for {path}"))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<AnimeSummary>> {
        let envelope: Envelope<Vec<RawAnime>> = self
            .get(
                "/anime",
                &[("q", query.to_string()), ("limit", SEARCH_LIMIT.to_string())],
            )
            .await?;
        Ok(envelope.data.into_iter().map(RawAnime::into_summary).collect())
    }

    pub async fn details(&self, mal_id: u64) -> Result<AnimeDetails> {
        let envelope: Envelope<RawAnime> = self.get(&format!("/anime/{mal_id}/full"), &[]).await?;
        Ok(envelope.data.into_details())
    }

    pub async fn episodes(&self, mal_id: u64) -> Result<Vec<EpisodeInfo>> {
        let envelope: Envelope<Vec<RawEpisode>> =
            self.get(&format!("/anime/{mal_id}/episodes"), &[]).await?;
        Ok(envelope.data.into_iter().map(EpisodeInfo::from).collect())
    }
}

// --- Jikan payloads ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RawAnime {
    mal_id: u64,
    title: String,
    #[serde(default)]
    title_english: Option<String>,
    #[serde(default)]
    title_japanese: Option<String>,
    #[serde(default)]
    synopsis: Option<String>,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    images: Option<RawImages>,
    #[serde(default)]
    trailer: Option<RawTrailer>,
    #[serde(default)]
    genres: Vec<RawNamed>,
    #[serde(default)]
    studios: Vec<RawNamed>,
    #[serde(rename = "type")]
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    #[serde(default)]
    jpg: Option<RawImageSet>,
}

#[derive(Debug, Deserialize)]
struct RawImageSet {
    #[serde(default)]
    large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrailer {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    mal_id: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_japanese: Option<String>,
    #[serde(default)]
    title_romanji: Option<String>,
    #[serde(default)]
    aired: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    filler: bool,
    #[serde(default)]
    recap: bool,
}

impl RawAnime {
    fn into_summary(self) -> AnimeSummary {
        self.into_details().summary
    }

    fn into_details(self) -> AnimeDetails {
        let image_url = self
            .images
            .and_then(|images| images.jpg)
            .and_then(|jpg| jpg.large_image_url);
        AnimeDetails {
            summary: AnimeSummary {
                id: self.mal_id,
                title: self.title,
                title_english: self.title_english,
                title_japanese: self.title_japanese,
                synopsis: self.synopsis,
                episodes: self.episodes,
                status: self.status,
                score: self.score,
                year: self.year,
                image_url,
                kind: self.kind,
                source: METADATA_SOURCE.to_string(),
            },
            season: self.season,
            trailer_url: self.trailer.and_then(|t| t.url),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            studios: self.studios.into_iter().map(|s| s.name).collect(),
            rating: self.rating,
            duration: self.duration,
        }
    }
}

impl From<RawEpisode> for EpisodeInfo {
    fn from(raw: RawEpisode) -> Self {
        Self {
            number: raw.mal_id,
            title: raw.title,
            title_japanese: raw.title_japanese,
            title_romanji: raw.title_romanji,
            aired: raw.aired,
            score: raw.score,
            filler: raw.filler,
            recap: raw.recap,
        }
    }
}
