/// Makes an attribute URL absolute: protocol-relative URLs get `https:`,
/// anything else that is not already `http(s)` is joined onto `base_url`.
pub fn normalize_url(src: &str, base_url: &str) -> String {
    if src.starts_with("http") {
        src.to_string()
    } else if src.starts_with("//") {
        format!("https:{src}")
    } else {
        let base = base_url.trim_end_matches('/');
        if src.starts_with('/') {
            format!("{base}{src}")
        } else {
            format!("{base}/{src}")
        }
    }
}

/// Episode thumbnails only keep absolute and protocol-relative URLs;
/// base-relative ones are dropped rather than resolved.
pub fn normalize_thumbnail(src: &str) -> Option<String> {
    if src.is_empty() {
        None
    } else if src.starts_with("http") {
        Some(src.to_string())
    } else if src.starts_with("//") {
        Some(format!("https:{src}"))
    } else {
        None
    }
}
