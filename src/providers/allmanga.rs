use anyhow::Result;
use tracing::debug;
use url::form_urlencoded;

use super::AnimeSource;
use crate::config::Preferences;
use crate::extract::{ExtractError, StreamExtractor};
use crate::filters::{self, SelectFilter, SourcePreference};
use crate::http::SiteClient;
use crate::scrape::{parse_detail, parse_listing};
use crate::types::{DetailRecord, PageResult, StreamCandidate, Translation};

pub struct AllMangaSource {
    http: SiteClient,
    prefs: Preferences,
}

#[derive(Debug, Default)]
struct SearchParams<'a> {
    query: &'a str,
    kind: &'a str,
    country: &'a str,
    page: u32,
}

impl AllMangaSource {
    pub fn new(prefs: Preferences) -> Result<Self> {
        let http = SiteClient::new(prefs.base_url())?;
        Ok(Self { http, prefs })
    }

    async fn search_page(&self, params: SearchParams<'_>) -> Result<PageResult> {
        let slug = search_slug(&params);
        let body = self.http.request(&slug).await?;
        let result = parse_listing(&body, &self.prefs);
        debug!(%slug, items = result.list.len(), "parsed listing");
        Ok(result)
    }

    /// Slug relative to the base URL, whether `url` is absolute or not.
    fn slug_of(&self, url: &str) -> String {
        url.replace(self.http.base_url(), "")
    }
}

fn search_slug(params: &SearchParams<'_>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let path = if params.query.is_empty() {
        "/anime"
    } else {
        query.append_pair("keyword", params.query);
        "/search"
    };
    if !params.kind.is_empty() {
        query.append_pair("tr", params.kind);
    }
    if !params.country.is_empty() {
        query.append_pair("cty", params.country);
    }
    if params.page > 1 {
        query.append_pair("page", &params.page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// `tr` is left out when no listing type is preferred.
fn latest_slug(page: u32, kind: Option<Translation>) -> String {
    match kind {
        Some(kind) => format!("/search-anime?page={page}&tr={}", kind.as_str()),
        None => format!("/search-anime?page={page}"),
    }
}

impl AnimeSource for AllMangaSource {
    async fn popular(&self, page: u32) -> Result<PageResult> {
        self.search_page(SearchParams {
            kind: self.prefs.listing_type().as_str(),
            page,
            ..SearchParams::default()
        })
        .await
    }

    async fn latest_updates(&self, page: u32) -> Result<PageResult> {
        let slug = latest_slug(page, self.prefs.popular_latest_type.first().copied());
        let body = self.http.request(&slug).await?;
        Ok(parse_listing(&body, &self.prefs))
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        filters: &[SelectFilter],
    ) -> Result<PageResult> {
        let (kind, country) = filters::selected_type_and_country(filters);
        self.search_page(SearchParams {
            query,
            kind: &kind,
            country: &country,
            page,
        })
        .await
    }

    async fn detail(&self, url: &str) -> Result<DetailRecord> {
        let slug = self.slug_of(url);
        let link = format!("{}{}", self.http.base_url(), slug);
        let body = self.http.request(&slug).await?;
        Ok(parse_detail(&body, &self.prefs, &link))
    }

    async fn video_list(&self, url: &str) -> Result<Vec<StreamCandidate>, ExtractError> {
        let body = self.http.request(url).await?;
        let extractor = StreamExtractor::new(self.http.base_url(), self.http.headers())?;
        extractor.extract(&body)
    }

    fn filter_list(&self) -> Vec<SelectFilter> {
        filters::filter_list()
    }

    fn source_preferences(&self) -> Vec<SourcePreference> {
        filters::source_preferences()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use httpmock::prelude::*;

    fn source(server: &MockServer) -> AllMangaSource {
        AllMangaSource::new(Preferences {
            base_url: server.base_url(),
            ..Preferences::default()
        })
        .unwrap()
    }

    fn cards(count: usize) -> String {
        (0..count)
            .map(|i| format!(r#"<a href="/bangumi/{i}"><img src="/i/{i}.jpg" alt="Show {i}"></a>"#))
            .collect()
    }

    #[test]
    fn slugs_carry_only_set_parameters() {
        assert_eq!(search_slug(&SearchParams::default()), "/anime");
        assert_eq!(
            search_slug(&SearchParams {
                query: "one piece",
                kind: "dub",
                country: "Japan",
                page: 2,
            }),
            "/search?keyword=one+piece&tr=dub&cty=Japan&page=2"
        );
        assert_eq!(
            search_slug(&SearchParams {
                kind: "sub",
                page: 1,
                ..SearchParams::default()
            }),
            "/anime?tr=sub"
        );
    }

    #[tokio::test]
    async fn popular_uses_preferred_type() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/anime")
                    .query_param("tr", "dub")
                    .query_param("page", "3");
                then.status(200).body(cards(20));
            })
            .await;

        let source = AllMangaSource::new(Preferences {
            base_url: server.base_url(),
            popular_latest_type: vec![Translation::Dub],
            ..Preferences::default()
        })
        .unwrap();
        let result = source.popular(3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result.list.len(), 20);
        assert!(result.has_next_page);
        assert_eq!(result.list[0].image_url, format!("{}/i/0.jpg", server.base_url()));
    }

    #[tokio::test]
    async fn latest_hits_search_anime() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search-anime")
                    .query_param("page", "1")
                    .query_param("tr", "sub");
                then.status(200).body(cards(3));
            })
            .await;

        let result = source(&server).latest_updates(1).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result.list.len(), 3);
        assert!(!result.has_next_page);
    }

    #[test]
    fn latest_slug_omits_type_when_none_preferred() {
        assert_eq!(latest_slug(2, None), "/search-anime?page=2");
        assert_eq!(
            latest_slug(1, Some(Translation::Dub)),
            "/search-anime?page=1&tr=dub"
        );
    }

    #[tokio::test]
    async fn latest_with_empty_type_list() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/search-anime").query_param("page", "2");
                then.status(200).body(cards(2));
            })
            .await;

        let source = AllMangaSource::new(Preferences {
            base_url: server.base_url(),
            popular_latest_type: Vec::new(),
            ..Preferences::default()
        })
        .unwrap();
        let result = source.latest_updates(2).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result.list.len(), 2);
    }

    #[tokio::test]
    async fn search_reads_filters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("keyword", "hero")
                    .query_param("tr", "sub")
                    .query_param("cty", "China");
                then.status(200).body(cards(1));
            })
            .await;

        let source = source(&server);
        let mut filters = source.filter_list();
        filters[0].state = 1;
        filters[1].state = 2;
        let result = source.search("hero", 1, &filters).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result.list[0].name, "Show 0");
    }

    #[tokio::test]
    async fn detail_accepts_absolute_and_relative_urls() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/bangumi/hero");
                then.status(200).body(
                    r#"<h1 data-jp="ヒーロー">Hero</h1>
                       <span class="status">Completed</span>
                       <div class="episode-list"><a href="/bangumi/hero/episode-1">Watch</a></div>"#,
                );
            })
            .await;

        let source = source(&server);
        let absolute = format!("{}/bangumi/hero", server.base_url());
        let detail = source.detail(&absolute).await.unwrap();
        assert_eq!(detail.link, absolute);
        assert_eq!(detail.name, "Hero");
        assert_eq!(detail.status, Status::Completed);
        assert_eq!(detail.chapters.len(), 1);

        let detail = source.detail("/bangumi/hero").await.unwrap();
        assert_eq!(detail.link, absolute);
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn video_list_extracts_candidates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bangumi/hero/episode-1");
                then.status(200).body(
                    r#"<iframe src="//streamwish.example/e/1"></iframe>
                       <script>var f = "https://cdn.x.com/v.m3u8?tok=abc" extra</script>"#,
                );
            })
            .await;

        let streams = source(&server)
            .video_list("/bangumi/hero/episode-1")
            .await
            .unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].quality, "StreamWish");
        assert_eq!(streams[1].url, "https://cdn.x.com/v.m3u8?tok=abc");
        assert_eq!(streams[1].quality, "HLS");
        assert_eq!(
            streams[1].headers.get("referer"),
            Some(&server.base_url())
        );
    }

    #[tokio::test]
    async fn video_list_wraps_fetch_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(500);
            })
            .await;

        let err = source(&server).video_list("/gone").await.unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to extract video sources: ")
        );
    }

    #[tokio::test]
    async fn detail_propagates_fetch_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bangumi/none");
                then.status(404);
            })
            .await;

        assert!(source(&server).detail("/bangumi/none").await.is_err());
    }
}
