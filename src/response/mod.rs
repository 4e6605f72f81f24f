//! Response shaping: the client-facing JSON contract and the rules that
//! resolve it from the inbound request plus whatever the webhook returned.

pub mod header_cache;

pub use header_cache::HeaderCache;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{escape_html, extract_image_urls, strip_dangerous_markup};

/// Inbound chat payload. Every field is optional and unknown fields are
/// preserved through the flattened map, so the body forwards to the
/// webhook with nothing dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "documentContent", skip_serializing_if = "Option::is_none")]
    pub document_content: Option<String>,
    #[serde(rename = "documentId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(rename = "fallbackDocument", skip_serializing_if = "Option::is_none")]
    pub fallback_document: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Success payload returned to the client. Absent optional fields are
/// serialized as explicit `null`s; clients rely on the keys being there.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub status: String,
    pub reply: String,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(rename = "documentHeader")]
    pub document_header: Option<String>,
    #[serde(rename = "fallbackDocument")]
    pub fallback_document: Option<String>,
    pub images: Vec<String>,
}

/// An empty string counts as absent everywhere in the resolution rules,
/// matching how clients leave fields blank rather than omitting them.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

fn data_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    non_empty(data.get(key).and_then(Value::as_str))
}

/// Shapes a webhook reply into the client response contract.
///
/// `data` is whatever JSON the webhook returned; field lookups on a
/// non-object resolve to nothing and the builder degrades instead of
/// failing. Webhook fields win for `reply`, `documentContent`, and
/// `documentHeader`; request fields win for `documentId` and
/// `fallbackDocument`. Headers are cached raw per document id and
/// escaped only on the way out.
pub fn build_response(request: &ChatRequest, data: &Value, headers: &HeaderCache) -> ChatResponse {
    let parsed_content = data_field(data, "documentContent")
        .or_else(|| non_empty(request.document_content.as_deref()))
        .unwrap_or_default();
    let images = extract_image_urls(parsed_content);

    let request_id = non_empty(request.document_id.as_deref());
    let header = match data_field(data, "documentHeader") {
        Some(header) => {
            if let Some(id) = request_id {
                headers.insert(id.to_string(), header.to_string());
            }
            Some(header.to_string())
        }
        None => request_id.and_then(|id| headers.get(id)),
    };

    let fallback = non_empty(request.fallback_document.as_deref())
        .map(str::to_string)
        .or_else(|| data_field(data, "fallbackDocument").map(str::to_string));

    let reply = data_field(data, "reply")
        .or_else(|| data_field(data, "message"))
        .unwrap_or("Processed");

    let document_id = request_id
        .map(str::to_string)
        .or_else(|| data_field(data, "documentId").map(str::to_string));

    ChatResponse {
        status: "success".to_string(),
        reply: strip_dangerous_markup(reply),
        document_id,
        document_header: header.map(|text| escape_html(&text)),
        fallback_document: fallback.map(|text| strip_dangerous_markup(&text)),
        images,
    }
}
