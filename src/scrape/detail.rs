use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::strategy::{SelectorChain, non_blank, text_of};
use crate::config::Preferences;
use crate::extract::normalize::{normalize_thumbnail, normalize_url};
use crate::types::{DetailRecord, EpisodeRef, Status, TitleLang};

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid CSS selector"));
static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid CSS selector"));
static GENRE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".genre a, .genres a, [class*='genre'] a").expect("valid CSS selector")
});
static EPISODE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"a[href*="/episode/"], a.episode-link, .episode-list a, [class*="episode"] a[href*="/watch/"], [class*="ep-"] a"#,
    )
    .expect("valid CSS selector")
});

static COVER: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::new(&[
        "img.cover",
        ".anime-cover img",
        ".poster img",
        "img[class*='cover']",
    ])
});
static DESCRIPTION: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::new(&[
        ".description",
        ".synopsis",
        ".summary",
        "[class*='desc']",
        "[class*='synopsis']",
    ])
});
static STATUS: LazyLock<SelectorChain> =
    LazyLock::new(|| SelectorChain::new(&[".status", "[class*='status']"]));

static EPISODE_NUMBER_PATTERNS: LazyLock<[(EpisodeField, Regex); 3]> = LazyLock::new(|| {
    [
        (EpisodeField::Url, Regex::new(r"(?i)episode[-_]?(\d+)").expect("valid regex")),
        (EpisodeField::Text, Regex::new(r"(?i)episode\s*(\d+)").expect("valid regex")),
        (EpisodeField::Text, Regex::new(r"(?i)ep\s*(\d+)").expect("valid regex")),
    ]
});

#[derive(Debug, Clone, Copy)]
enum EpisodeField {
    Url,
    Text,
}

/// Parses a detail page. `link` is the canonical page URL reported back to
/// the host.
pub fn parse_detail(body: &str, prefs: &Preferences, link: &str) -> DetailRecord {
    let doc = Html::parse_document(body);
    DetailRecord {
        name: title(&doc, prefs.title_lang),
        image_url: cover(&doc, prefs.base_url()),
        link: link.to_string(),
        description: DESCRIPTION
            .first_value(&doc, |el| Some(text_of(el)))
            .unwrap_or_default(),
        genre: genres(&doc),
        status: STATUS
            .first(&doc)
            .map(|el| Status::from_text(&text_of(el)))
            .unwrap_or_default(),
        chapters: episodes(&doc, prefs.ep_thumbnail),
    }
}

fn title(doc: &Html, lang: TitleLang) -> String {
    let Some(h1) = doc.select(&TITLE_SEL).next() else {
        return String::new();
    };
    match lang {
        TitleLang::Title => text_of(h1),
        TitleLang::Japanese => non_blank(h1, "data-jp")
            .map(str::to_string)
            .unwrap_or_else(|| text_of(h1)),
    }
}

fn cover(doc: &Html, base_url: &str) -> String {
    COVER
        .first_value(doc, |img| {
            non_blank(img, "src")
                .or_else(|| non_blank(img, "data-src"))
                .map(str::to_string)
        })
        .map(|src| normalize_url(&src, base_url))
        .unwrap_or_default()
}

fn genres(doc: &Html) -> Vec<String> {
    let mut genre: Vec<String> = Vec::new();
    for text in doc.select(&GENRE_SEL).map(text_of) {
        if !text.is_empty() && !genre.contains(&text) {
            genre.push(text);
        }
    }
    genre
}

fn episodes(doc: &Html, with_thumbnails: bool) -> Vec<EpisodeRef> {
    let mut chapters: Vec<EpisodeRef> = doc
        .select(&EPISODE_SEL)
        .enumerate()
        .filter_map(|(index, anchor)| {
            let url = anchor.value().attr("href").filter(|h| !h.is_empty() && *h != "#")?;
            let text = text_of(anchor);
            let number = episode_number(url, &text).unwrap_or(index as u32 + 1);
            let thumbnail_url = if with_thumbnails {
                episode_thumbnail(anchor)
            } else {
                None
            };
            Some(EpisodeRef {
                name: episode_name(&text, number),
                url: url.to_string(),
                thumbnail_url,
            })
        })
        .collect();
    chapters.reverse();
    chapters
}

/// First number found by the URL pattern, then the two text patterns.
pub fn episode_number(url: &str, text: &str) -> Option<u32> {
    EPISODE_NUMBER_PATTERNS.iter().find_map(|(field, pattern)| {
        let haystack = match field {
            EpisodeField::Url => url,
            EpisodeField::Text => text,
        };
        pattern.captures(haystack)?.get(1)?.as_str().parse().ok()
    })
}

pub fn episode_name(text: &str, number: u32) -> String {
    if text.is_empty() || text == "Watch" {
        format!("Episode {number}")
    } else if !text.to_lowercase().contains("episode") {
        format!("Episode {number}: {text}")
    } else {
        text.to_string()
    }
}

fn episode_thumbnail(anchor: ElementRef<'_>) -> Option<String> {
    let img = anchor.select(&IMG_SEL).next()?;
    let src = non_blank(img, "src").or_else(|| non_blank(img, "data-src"))?;
    normalize_thumbnail(src)
}
