use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::links::normalize_google_link;

static MARKDOWN_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());

static HTML_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img [^>]*src=["']([^"'>]+)["'][^>]*>"#).unwrap());

/// Collect image URLs from document content: markdown `![alt](url)`
/// first, then HTML `<img src=...>`. Each URL is trimmed and normalized
/// before deduplication, so two share-link spellings of the same Drive
/// file collapse into one entry. First-seen order is preserved.
pub fn extract_image_urls(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for caps in MARKDOWN_IMAGE_RE.captures_iter(content) {
        if let Some(raw) = caps.get(1) {
            let url = normalize_google_link(raw.as_str().trim());
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }

    for caps in HTML_IMAGE_RE.captures_iter(content) {
        if let Some(raw) = caps.get(1) {
            let url = normalize_google_link(raw.as_str().trim());
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }

    urls
}
