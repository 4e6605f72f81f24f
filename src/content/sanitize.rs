//! Pattern-based markup hygiene for webhook payloads.
//!
//! Sequential scrub passes over untrusted HTML-ish text. This is payload
//! shaping, not a full HTML parser; inputs that splice tags across pass
//! boundaries are outside the contract.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());

static HANDLER_DOUBLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)on[a-z]+\s*=\s*"[^"]*""#).unwrap());

static HANDLER_SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on[a-z]+\s*=\s*'[^']*'").unwrap());

static JS_URL_DOUBLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*"\s*javascript:[^"']*""#).unwrap());

static JS_URL_SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*'\s*javascript:[^"']*'"#).unwrap());

static BANNED_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(iframe|object|embed|link|meta)[^>]*>").unwrap());

/// Strip script/style blocks, inline event handlers, `javascript:` URLs
/// and embed-style tags from text destined for the client.
///
/// Passes run in a fixed order; `javascript:` href/src attributes are
/// rewritten to `="#"` rather than removed so the element survives.
pub fn strip_dangerous_markup(html: &str) -> String {
    let cleaned = SCRIPT_RE.replace_all(html, "");
    let cleaned = STYLE_RE.replace_all(&cleaned, "");
    let cleaned = HANDLER_DOUBLE_RE.replace_all(&cleaned, "");
    let cleaned = HANDLER_SINGLE_RE.replace_all(&cleaned, "");
    let cleaned = JS_URL_DOUBLE_RE.replace_all(&cleaned, "${1}=\"#\"");
    let cleaned = JS_URL_SINGLE_RE.replace_all(&cleaned, "${1}=\"#\"");
    BANNED_TAG_RE.replace_all(&cleaned, "").into_owned()
}

/// Escape the five HTML metacharacters. Ampersand goes first so already
/// produced entities are not double-escaped within a single call; the
/// function itself performs no entity detection, so escaping twice
/// escapes twice.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
