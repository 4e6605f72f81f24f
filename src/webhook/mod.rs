//! Outbound webhook client.
//!
//! One POST per chat request, raced end to end against a caller-armed
//! cancellation token. The client carries no total-request timeout of
//! its own; the deadline lives with the request handler and stays armed
//! from send through body decode.

use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::response::ChatRequest;

/// Raw webhook outcome: the HTTP status plus whatever JSON the body
/// held. Status interpretation is the gateway's job, not the client's.
#[derive(Debug, Clone)]
pub struct WebhookReply {
    pub status: u16,
    pub data: Value,
}

#[derive(Debug)]
pub struct WebhookClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: config.url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Deadline the caller should arm before `call`.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts the payload, racing the whole exchange against `cancel`.
    /// Cancellation before response headers arrive is an error; transport
    /// failures on the send are errors; any HTTP status is `Ok`. Once
    /// headers have arrived the status is kept, and a malformed,
    /// unreadable, or deadline-stalled body degrades to `{}` instead of
    /// failing the call.
    pub async fn call(
        &self,
        payload: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<WebhookReply, WebhookError> {
        let started = Instant::now();

        let response = tokio::select! {
            () = cancel.cancelled() => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!("webhook call cancelled after {elapsed_ms}ms");
                return Err(WebhookError::Cancelled { elapsed_ms });
            }
            result = self.client.post(&self.url).json(payload).send() => {
                result.map_err(WebhookError::Unreachable)?
            }
        };

        let status = response.status().as_u16();
        // The deadline stays armed through the body read: a webhook that
        // sends headers then stalls the body loses its data, not the call.
        let data = tokio::select! {
            () = cancel.cancelled() => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!("webhook body abandoned after {elapsed_ms}ms, continuing without data");
                Value::Object(serde_json::Map::new())
            }
            body = response.json::<Value>() => {
                body.unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
            }
        };
        debug!("webhook replied with status {status}");

        Ok(WebhookReply { status, data })
    }
}
