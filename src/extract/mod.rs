//! Stream candidate discovery for episode pages.
//!
//! Three passes run over the same document: iframes, `<video><source>`
//! elements, then inline scripts. Their results are concatenated in that
//! order and deduplicated by resolved URL, so a URL found by an earlier pass
//! keeps that pass's label.

pub mod matchers;
pub mod normalize;

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use anyhow::anyhow;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::types::StreamCandidate;
use matchers::{ScriptMatcher, default_matchers, server_name};
use normalize::normalize_url;

static IFRAME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe[src]").expect("valid CSS selector"));
static SOURCE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video source[src]").expect("valid CSS selector"));
static SCRIPT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid CSS selector"));

#[derive(Debug, Error)]
#[error("Failed to extract video sources: {message}")]
pub struct ExtractError {
    message: String,
}

impl From<anyhow::Error> for ExtractError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
        }
    }
}

pub struct StreamExtractor {
    base_url: String,
    headers: HashMap<String, String>,
    matchers: Vec<ScriptMatcher>,
}

impl StreamExtractor {
    pub fn new(base_url: &str, headers: HashMap<String, String>) -> Result<Self, ExtractError> {
        let matchers = default_matchers().map_err(|err| anyhow!(err))?;
        Ok(Self::with_matchers(base_url, headers, matchers))
    }

    pub fn with_matchers(
        base_url: &str,
        headers: HashMap<String, String>,
        matchers: Vec<ScriptMatcher>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            matchers,
        }
    }

    pub fn push_matcher(&mut self, matcher: ScriptMatcher) {
        self.matchers.push(matcher);
    }

    pub fn extract(&self, body: &str) -> Result<Vec<StreamCandidate>, ExtractError> {
        let doc = Html::parse_document(body);
        let mut streams = self.iframe_pass(&doc);
        streams.extend(self.direct_source_pass(&doc));
        streams.extend(self.script_pass(&doc));
        let found = streams.len();
        let unique = dedup_by_url(streams);
        debug!(found, unique = unique.len(), "extracted stream candidates");
        Ok(unique)
    }

    fn iframe_pass(&self, doc: &Html) -> Vec<StreamCandidate> {
        doc.select(&IFRAME_SEL)
            .filter_map(|el| el.value().attr("src"))
            .filter(|src| !src.is_empty())
            .map(|src| {
                let url = normalize_url(src, &self.base_url);
                let server = server_name(&url);
                StreamCandidate::new(url, server, &self.headers)
            })
            .collect()
    }

    fn direct_source_pass(&self, doc: &Html) -> Vec<StreamCandidate> {
        doc.select(&SOURCE_SEL)
            .filter_map(|el| {
                let attrs = el.value();
                let src = attrs.attr("src").filter(|s| !s.is_empty())?;
                let quality = attrs
                    .attr("label")
                    .filter(|s| !s.is_empty())
                    .or_else(|| attrs.attr("data-quality").filter(|s| !s.is_empty()))
                    .unwrap_or("Direct");
                Some(StreamCandidate::new(
                    normalize_url(src, &self.base_url),
                    quality,
                    &self.headers,
                ))
            })
            .collect()
    }

    fn script_pass(&self, doc: &Html) -> Vec<StreamCandidate> {
        let mut streams = Vec::new();
        for script in doc.select(&SCRIPT_SEL) {
            let content: String = script.text().collect();
            for matcher in &self.matchers {
                for url in matcher.find_all(&content) {
                    streams.push(StreamCandidate::new(url, matcher.label(), &self.headers));
                }
            }
        }
        streams
    }
}

/// Keeps the first candidate for each URL, preserving order.
pub fn dedup_by_url(streams: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    let mut seen = HashSet::new();
    streams
        .into_iter()
        .filter(|stream| seen.insert(stream.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://allmanga.to";

    fn extractor() -> StreamExtractor {
        let headers = HashMap::from([("referer".to_string(), BASE.to_string())]);
        StreamExtractor::new(BASE, headers).unwrap()
    }

    #[test]
    fn iframes_are_labelled_by_host() {
        let html = r#"
            <iframe src="//gogoanime.example/embed/1"></iframe>
            <iframe src="/player/2"></iframe>
            <iframe src=""></iframe>
        "#;
        let streams = extractor().extract(html).unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "https://gogoanime.example/embed/1");
        assert_eq!(streams[0].quality, "GoGoAnime");
        assert_eq!(streams[1].url, "https://allmanga.to/player/2");
        assert_eq!(streams[1].quality, "Default");
        assert_eq!(streams[1].original_url, streams[1].url);
        assert_eq!(streams[1].headers.get("referer").map(String::as_str), Some(BASE));
    }

    #[test]
    fn video_sources_use_label_then_data_quality() {
        let html = r#"
            <video>
              <source src="https://cdn.example/1080.mp4" label="1080p">
              <source src="https://cdn.example/720.mp4" data-quality="720p">
              <source src="/local.mp4">
            </video>
        "#;
        let streams = extractor().extract(html).unwrap();
        let labels: Vec<_> = streams.iter().map(|s| s.quality.as_str()).collect();
        assert_eq!(labels, vec!["1080p", "720p", "Direct"]);
        assert_eq!(streams[2].url, "https://allmanga.to/local.mp4");
    }

    #[test]
    fn script_urls_are_found() {
        let html = r#"<script>var s = "https://cdn.x.com/v.m3u8?tok=abc" extra;
            var f = 'https://cdn.x.com/v.mp4';</script>"#;
        let streams = extractor().extract(html).unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "https://cdn.x.com/v.m3u8?tok=abc");
        assert_eq!(streams[0].quality, "HLS");
        assert_eq!(streams[1].url, "https://cdn.x.com/v.mp4");
        assert_eq!(streams[1].quality, "MP4");
    }

    #[test]
    fn earliest_pass_wins_on_duplicate_url() {
        let html = r#"
            <script>load("https://cdn.x.com/master.m3u8")</script>
            <iframe src="https://cdn.x.com/master.m3u8"></iframe>
            <video><source src="https://cdn.x.com/master.m3u8" label="HD"></video>
        "#;
        let streams = extractor().extract(html).unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].quality, "Default");
    }

    #[test]
    fn repeated_script_urls_collapse() {
        let html = r#"<script>a="https://c.x/v.m3u8"; b="https://c.x/v.m3u8";</script>"#;
        let streams = extractor().extract(html).unwrap();
        assert_eq!(streams.len(), 1);
    }

    #[test]
    fn page_without_sources_is_empty() {
        let streams = extractor().extract("<html><body><p>nothing</p></body></html>");
        assert!(streams.unwrap().is_empty());
    }

    #[test]
    fn extra_matchers_run_after_defaults() {
        let mut ex = extractor();
        ex.push_matcher(ScriptMatcher::new("DASH", r#"https?://[^\s"']+\.mpd"#).unwrap());
        let streams = ex
            .extract(r#"<script>x="https://c.x/a.mpd"; y="https://c.x/a.mp4"</script>"#)
            .unwrap();
        let labels: Vec<_> = streams.iter().map(|s| s.quality.as_str()).collect();
        assert_eq!(labels, vec!["MP4", "DASH"]);
    }

    #[test]
    fn one_extractor_serves_many_pages() {
        let ex = extractor();
        let first = ex
            .extract(r#"<iframe src="https://filemoon.sx/e/1"></iframe>"#)
            .unwrap();
        let second = ex
            .extract(r#"<video><source src="/v.mp4"></video><script>"https://c.x/a.m3u8"</script>"#)
            .unwrap();
        assert_eq!(first[0].quality, "FileMoon");
        let labels: Vec<_> = second.iter().map(|s| s.quality.as_str()).collect();
        assert_eq!(labels, vec!["Direct", "HLS"]);
    }

    #[test]
    fn error_message_has_fixed_prefix() {
        let err = ExtractError::from(anyhow!("boom"));
        assert_eq!(err.to_string(), "Failed to extract video sources: boom");
    }
}
