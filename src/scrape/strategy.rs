use scraper::{ElementRef, Html, Selector};

/// Ordered list of selectors; the first one that matches anything wins.
#[derive(Debug)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn new(css: &[&str]) -> Self {
        let selectors = css
            .iter()
            .map(|s| Selector::parse(s).expect("valid CSS selector"))
            .collect();
        Self { selectors }
    }

    pub fn first<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|sel| doc.select(sel).next())
    }

    /// Like [`first`](Self::first), but skips matches whose `value` is empty.
    pub fn first_value<'a, F>(&self, doc: &'a Html, value: F) -> Option<String>
    where
        F: Fn(ElementRef<'a>) -> Option<String>,
    {
        self.selectors
            .iter()
            .flat_map(|sel| doc.select(sel))
            .find_map(|el| value(el).filter(|v| !v.is_empty()))
    }
}

/// Trimmed text of an element.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Attribute value if present and not blank.
pub fn non_blank<'a>(el: ElementRef<'a>, attr: &str) -> Option<&'a str> {
    el.value().attr(attr).filter(|v| !v.trim().is_empty())
}
