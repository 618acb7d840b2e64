//! HLS master playlist parsing.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const AUTO: &str = "auto";

static RESOLUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RESOLUTION=(\d+)x(\d+)").expect("valid regex"));
static BANDWIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BANDWIDTH=(\d+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub url: String,
    pub resolution: String,
    pub bandwidth: Option<u64>,
}

/// Variants keyed by `"{height}p"`, plus [`AUTO`].
pub type Variants = BTreeMap<String, StreamVariant>;

#[derive(Debug, Error)]
pub enum HlsError {
    #[error("invalid variant url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("manifest has no stream variants")]
    NoVariants,
}

/// Collects every `#EXT-X-STREAM-INF` variant that declares a resolution.
/// Relative variant URIs are resolved against `manifest_url`.
pub fn parse_master_playlist(text: &str, manifest_url: &str) -> Result<Variants, HlsError> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut variants = Variants::new();
    let mut best: Option<(u64, String)> = None;

    for (idx, line) in lines.iter().enumerate() {
        if !line.starts_with("#EXT-X-STREAM-INF") {
            continue;
        }
        let Some(res) = RESOLUTION_RE.captures(line) else {
            continue;
        };
        let Some(uri) = lines[idx + 1..].iter().find(|l| !l.is_empty()) else {
            continue;
        };
        let (width, height) = (&res[1], &res[2]);
        let bandwidth = BANDWIDTH_RE
            .captures(line)
            .and_then(|caps| caps[1].parse().ok());
        let label = format!("{height}p");

        if let Ok(h) = height.parse::<u64>() {
            if best.as_ref().is_none_or(|(top, _)| h > *top) {
                best = Some((h, label.clone()));
            }
        }
        variants.insert(
            label,
            StreamVariant {
                url: resolve(uri, manifest_url)?,
                resolution: format!("{width}x{height}"),
                bandwidth,
            },
        );
    }

    let (_, top) = best.ok_or(HlsError::NoVariants)?;
    let auto = variants[&top].clone();
    variants.insert(AUTO.to_string(), auto);
    Ok(variants)
}

/// Single `auto` entry pointing at the manifest itself.
pub fn fallback_variants(manifest_url: &str) -> Variants {
    Variants::from([(
        AUTO.to_string(),
        StreamVariant {
            url: manifest_url.to_string(),
            resolution: "unknown".to_string(),
            bandwidth: None,
        },
    )])
}

fn resolve(uri: &str, manifest_url: &str) -> Result<String, HlsError> {
    if uri.starts_with("http") {
        return Ok(uri.to_string());
    }
    Url::parse(manifest_url)
        .and_then(|base| base.join(uri))
        .map(String::from)
        .map_err(|source| HlsError::InvalidUrl {
            url: uri.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "https://cdn.example/show/ep1/master.m3u8";

    #[test]
    fn auto_points_at_highest_resolution() {
        let text = "#EXTM3U\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1400000,RESOLUTION=1280x720\n\
            720/index.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1920x1080\n\
            https://other.example/1080/index.m3u8\n";
        let variants = parse_master_playlist(text, MANIFEST).unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(
            variants["720p"],
            StreamVariant {
                url: "https://cdn.example/show/ep1/720/index.m3u8".to_string(),
                resolution: "1280x720".to_string(),
                bandwidth: Some(1_400_000),
            }
        );
        assert_eq!(variants["1080p"].url, "https://other.example/1080/index.m3u8");
        assert_eq!(variants[AUTO], variants["1080p"]);
    }

    #[test]
    fn height_ordering_is_numeric() {
        let text = "#EXT-X-STREAM-INF:RESOLUTION=1920x1080\n/hi.m3u8\n\
            #EXT-X-STREAM-INF:RESOLUTION=640x360\n/lo.m3u8\n";
        let variants = parse_master_playlist(text, MANIFEST).unwrap();
        assert_eq!(variants[AUTO].url, "https://cdn.example/hi.m3u8");
        assert_eq!(variants["360p"].bandwidth, None);
    }

    #[test]
    fn blank_lines_and_crlf_are_skipped() {
        let text = "#EXTM3U\r\n#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480\r\n\r\nlow.m3u8\r\n";
        let variants = parse_master_playlist(text, MANIFEST).unwrap();
        assert_eq!(variants["480p"].url, "https://cdn.example/show/ep1/low.m3u8");
    }

    #[test]
    fn tags_without_resolution_are_ignored() {
        let text = "#EXT-X-STREAM-INF:BANDWIDTH=64000\naudio.m3u8\n";
        assert!(matches!(
            parse_master_playlist(text, MANIFEST),
            Err(HlsError::NoVariants)
        ));
    }

    #[test]
    fn unresolvable_relative_uri_is_an_error() {
        let text = "#EXT-X-STREAM-INF:RESOLUTION=1280x720\n720.m3u8\n";
        assert!(matches!(
            parse_master_playlist(text, "not a url"),
            Err(HlsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn oversized_height_still_becomes_auto() {
        let text = "#EXT-X-STREAM-INF:RESOLUTION=1x99999999999\nhuge.m3u8\n";
        let variants = parse_master_playlist(text, MANIFEST).unwrap();
        assert_eq!(variants[AUTO], variants["99999999999p"]);
        assert_eq!(variants[AUTO].url, "https://cdn.example/show/ep1/huge.m3u8");
    }

    #[test]
    fn fallback_is_single_auto_entry() {
        let variants = fallback_variants(MANIFEST);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[AUTO].url, MANIFEST);
        assert_eq!(variants[AUTO].resolution, "unknown");
        assert_eq!(variants[AUTO].bandwidth, None);
    }
}
