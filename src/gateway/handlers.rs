use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tokio_util::sync::CancellationToken;

use super::AppState;
use crate::error::WebhookError;
use crate::response::{ChatRequest, build_response};

/// GET /health — liveness plus header cache occupancy
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "cachedHeaders": state.headers.len(),
    });
    Json(body)
}

/// POST /api/chat — forward the payload to the webhook and shape the reply
pub(super) async fn handle_chat(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    // ── Parse body ──
    let request: ChatRequest = if body.is_empty() {
        ChatRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("rejected chat payload: {e}");
                return error_response(StatusCode::BAD_REQUEST, "Invalid JSON payload", None);
            }
        }
    };
    let fallback = request.fallback_document.clone();

    // ── Forward with the webhook deadline armed ──
    let cancel = CancellationToken::new();
    let deadline = state.webhook.timeout();
    let timer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        })
    };

    let outcome = state.webhook.call(&request, &cancel).await;
    timer.abort();

    let reply = match outcome {
        Ok(reply) => reply,
        Err(WebhookError::Cancelled { elapsed_ms }) => {
            tracing::warn!("chat request abandoned, webhook silent for {elapsed_ms}ms");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "Request timed out",
                fallback.as_deref(),
            );
        }
        Err(error) => {
            tracing::warn!("webhook transport failed: {error}");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "Unable to reach chat service",
                fallback.as_deref(),
            );
        }
    };

    // ── Map upstream status ──
    if reply.status >= 400 {
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let message = if reply.status >= 500 {
            "Upstream error"
        } else {
            "Invalid request"
        };
        tracing::info!("webhook answered with status {}", reply.status);
        return error_response(status, message, fallback.as_deref());
    }

    let response = build_response(&request, &reply.data, &state.headers);
    tracing::debug!(
        "chat relayed: {} image(s), document {:?}",
        response.images.len(),
        response.document_id
    );
    Json(response).into_response()
}

/// Fixed error envelope. The caller's own fallback document rides along
/// untouched so the client can keep rendering offline content.
pub(super) fn error_response(status: StatusCode, message: &str, fallback: Option<&str>) -> Response {
    let fallback = fallback.filter(|text| !text.is_empty());
    let body = serde_json::json!({
        "status": "error",
        "message": message,
        "fallbackDocument": fallback,
    });
    (status, Json(body)).into_response()
}
