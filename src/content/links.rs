use regex::Regex;
use std::sync::LazyLock;

static GOOGLE_DRIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://drive\.google\.com/file/d/([a-zA-Z0-9_-]+)").unwrap()
});

static GOOGLE_DOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://docs\.google\.com/document/d/([a-zA-Z0-9_-]+)").unwrap()
});

/// Rewrite Google Drive/Docs share links into directly renderable URLs.
///
/// Drive file links become `uc?export=view` image URLs; Docs document
/// links become PDF export URLs. Anything else passes through unchanged.
/// Trailing path segments and query parameters of a share link are
/// dropped by the rewrite.
pub fn normalize_google_link(url: &str) -> String {
    if let Some(caps) = GOOGLE_DRIVE_RE.captures(url)
        && let Some(id) = caps.get(1)
    {
        return format!("https://drive.google.com/uc?export=view&id={}", id.as_str());
    }

    if let Some(caps) = GOOGLE_DOC_RE.captures(url)
        && let Some(id) = caps.get(1)
    {
        return format!(
            "https://docs.google.com/document/d/{}/export?format=pdf",
            id.as_str()
        );
    }

    url.to_string()
}
