use regex::Regex;

/// Known embed hosts, checked in order against an iframe URL.
pub const EMBED_HOSTS: &[(&str, &str)] = &[
    ("gogoanime", "GoGoAnime"),
    ("vidstreaming", "VidStreaming"),
    ("streamwish", "StreamWish"),
    ("filemoon", "FileMoon"),
    ("doodstream", "DoodStream"),
];

pub const DEFAULT_SERVER: &str = "Default";

pub fn server_name(src: &str) -> &'static str {
    EMBED_HOSTS
        .iter()
        .find(|(needle, _)| src.contains(needle))
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_SERVER)
}

/// A pattern run over inline script text; every match becomes a stream
/// candidate with `label` as its quality.
#[derive(Debug, Clone)]
pub struct ScriptMatcher {
    label: String,
    pattern: Regex,
}

impl ScriptMatcher {
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// All matches in `text`, with quotes and backslashes removed.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| {
                m.as_str()
                    .chars()
                    .filter(|c| !matches!(c, '\'' | '"' | '\\'))
                    .collect()
            })
            .collect()
    }
}

pub fn default_matchers() -> Result<Vec<ScriptMatcher>, regex::Error> {
    Ok(vec![
        ScriptMatcher::new("HLS", r#"https?://[^\s"']+\.m3u8[^\s"']*"#)?,
        ScriptMatcher::new("MP4", r#"https?://[^\s"']+\.mp4[^\s"']*"#)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_hosts_follow_priority() {
        assert_eq!(server_name("https://gogoanime.example/e/1"), "GoGoAnime");
        assert_eq!(
            server_name("https://filemoon.sx/e/abc?from=streamwish"),
            "StreamWish"
        );
        assert_eq!(server_name("https://player.example/e/1"), "Default");
        // substring test is case-sensitive
        assert_eq!(server_name("https://FileMoon.sx/e/1"), "Default");
    }

    #[test]
    fn hls_match_stops_at_quote() {
        let matchers = default_matchers().unwrap();
        let found = matchers[0].find_all(r#"var src = "https://cdn.x.com/v.m3u8?tok=abc" extra"#);
        assert_eq!(found, vec!["https://cdn.x.com/v.m3u8?tok=abc"]);
    }

    #[test]
    fn matches_are_scrubbed_of_backslashes() {
        let matchers = default_matchers().unwrap();
        let found = matchers[1].find_all(r"src: https://cdn.x.com/a\.mp4 next");
        assert_eq!(found, vec!["https://cdn.x.com/a.mp4"]);
    }

    #[test]
    fn custom_matcher_is_pluggable() {
        let dash = ScriptMatcher::new("DASH", r#"https?://[^\s"']+\.mpd"#).unwrap();
        assert_eq!(dash.label(), "DASH");
        assert_eq!(
            dash.find_all("x='https://a.b/manifest.mpd'"),
            vec!["https://a.b/manifest.mpd"]
        );
    }
}
