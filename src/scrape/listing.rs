use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::strategy::{non_blank, text_of};
use crate::config::Preferences;
use crate::extract::normalize::normalize_url;
use crate::types::{ListItem, PageResult, TitleLang};

/// Listing pages carry no pagination marker; a full page is taken to mean
/// there is another one.
pub const FULL_PAGE_SIZE: usize = 20;

static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/bangumi/"]"#).expect("valid CSS selector"));
static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid CSS selector"));

pub fn parse_listing(body: &str, prefs: &Preferences) -> PageResult {
    let doc = Html::parse_document(body);
    let mut seen = HashSet::new();
    let mut list = Vec::new();

    for card in doc.select(&CARD_SEL) {
        let Some(link) = card.value().attr("href") else {
            continue;
        };
        if !seen.insert(link) {
            continue;
        }

        let img = card.select(&IMG_SEL).next();
        let Some(name) = card_name(card, img, prefs.title_lang) else {
            warn!(link, "skipping card without a title");
            continue;
        };
        let image_url = img
            .and_then(|img| {
                non_blank(img, "src").or_else(|| non_blank(img, "data-src"))
            })
            .map(|src| normalize_url(src, prefs.base_url()))
            .unwrap_or_default();

        list.push(ListItem {
            name,
            link: link.to_string(),
            image_url,
        });
    }

    let has_next_page = list.len() >= FULL_PAGE_SIZE;
    PageResult {
        list,
        has_next_page,
    }
}

fn card_name(card: ElementRef<'_>, img: Option<ElementRef<'_>>, lang: TitleLang) -> Option<String> {
    let preferred = match lang {
        TitleLang::Title => "alt",
        TitleLang::Japanese => "title",
    };
    img.and_then(|img| {
        non_blank(img, preferred)
            .or_else(|| non_blank(img, "alt"))
            .or_else(|| non_blank(img, "title"))
    })
    .map(|name| name.trim().to_string())
    .or_else(|| Some(text_of(card)).filter(|text| !text.is_empty()))
}
