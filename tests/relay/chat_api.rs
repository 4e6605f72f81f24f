use docrelay::config::Config;
use docrelay::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RelayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl RelayTestServer {
    async fn start(webhook_url: &str, timeout_ms: u64) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral relay listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral relay listener should expose local address")
            .port();

        let mut config = Config::default();
        config.webhook.url = webhook_url.to_string();
        config.webhook.timeout_ms = timeout_ms;
        config.cache.header_entries = 32;

        let handle = tokio::spawn(async move { run_gateway_with_listener(listener, config).await });

        wait_until_relay_ready(port).await;

        Self { port, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for RelayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_relay_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("relay did not become ready on port {port}");
}

#[tokio::test]
async fn success_reply_is_sanitized_and_images_normalized() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Here you go<script>alert(1)</script>",
            "documentContent": concat!(
                "![chart](https://drive.google.com/file/d/abc123/view?usp=sharing) ",
                r#"<img src="https://drive.google.com/file/d/abc123/preview"/>"#,
            ),
            "documentHeader": "Q3 <Report>",
            "documentId": "hook-doc",
        })))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&format!("{}/hook", webhook.uri()), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({
            "message": "show me the chart",
            "documentId": "req-doc",
            "fallbackDocument": "<p onclick=\"x()\">Cached</p>",
        }))
        .send()
        .await
        .expect("chat request should complete");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("response should be json");
    assert_eq!(body["status"], "success");
    assert_eq!(body["reply"], "Here you go");
    assert_eq!(
        body["images"],
        json!(["https://drive.google.com/uc?export=view&id=abc123"])
    );
    assert_eq!(body["documentHeader"], "Q3 &lt;Report&gt;");
    assert_eq!(body["documentId"], "req-doc");
    assert_eq!(body["fallbackDocument"], "<p >Cached</p>");
}

#[tokio::test]
async fn malformed_json_is_rejected_without_webhook_call() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .header("Content-Type", "application/json")
        .body("this is not json")
        .send()
        .await
        .expect("malformed request should complete");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("denial should be json");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid JSON payload");
    assert_eq!(body["fallbackDocument"], Value::Null);
}

#[tokio::test]
async fn slow_webhook_times_out_with_verbatim_fallback_echo() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reply": "too late"}))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 250).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({
            "message": "hello",
            "fallbackDocument": "<script>x</script>offline copy",
        }))
        .send()
        .await
        .expect("timed-out request should complete");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.expect("timeout response should be json");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Request timed out");
    // The fallback comes back exactly as sent; sanitization is a
    // success-path concern.
    assert_eq!(body["fallbackDocument"], "<script>x</script>offline copy");
}

#[tokio::test]
async fn upstream_server_error_propagates_status() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "scenario died"})))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({"message": "hi", "fallbackDocument": "<i>stash</i>"}))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.expect("error response should be json");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Upstream error");
    assert_eq!(body["fallbackDocument"], "<i>stash</i>");
}

#[tokio::test]
async fn upstream_client_error_propagates_status() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({"message": "hi", "fallbackDocument": "<b>keep</b>"}))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.expect("error response should be json");
    assert_eq!(body["message"], "Invalid request");
    assert_eq!(body["fallbackDocument"], "<b>keep</b>");
}

#[tokio::test]
async fn unreachable_webhook_reports_bad_gateway() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("probe port should bind");
    let dead_port = listener.local_addr().expect("probe addr").port();
    drop(listener);

    let server = RelayTestServer::start(&format!("http://127.0.0.1:{dead_port}/hook"), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.expect("error response should be json");
    assert_eq!(body["message"], "Unable to reach chat service");
}

#[tokio::test]
async fn document_header_served_from_cache_when_webhook_omits_it() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "first",
            "documentHeader": "Cached <Header>",
        })))
        .up_to_n_times(1)
        .mount(&webhook)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "second"})))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let first: Value = client
        .post(server.url("/api/chat"))
        .json(&json!({"message": "hi", "documentId": "doc-9"}))
        .send()
        .await
        .expect("first request should complete")
        .json()
        .await
        .expect("first response should be json");
    assert_eq!(first["reply"], "first");
    assert_eq!(first["documentHeader"], "Cached &lt;Header&gt;");

    let second: Value = client
        .post(server.url("/api/chat"))
        .json(&json!({"message": "again", "documentId": "doc-9"}))
        .send()
        .await
        .expect("second request should complete")
        .json()
        .await
        .expect("second response should be json");
    assert_eq!(second["reply"], "second");
    assert_eq!(second["documentHeader"], "Cached &lt;Header&gt;");

    let health: Value = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");
    assert_eq!(health["cachedHeaders"], 1);
}

#[tokio::test]
async fn empty_body_forwards_empty_object() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .header("Content-Type", "application/json")
        .send()
        .await
        .expect("empty request should complete");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("response should be json");
    assert_eq!(body["reply"], "ok");
}

#[tokio::test]
async fn unknown_fields_forward_verbatim() {
    let webhook = MockServer::start().await;
    let payload = json!({"message": "hi", "sessionToken": "tok-1", "trace": {"id": 7}});
    Mock::given(method("POST"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "seen"})))
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .json(&payload)
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("response should be json");
    assert_eq!(body["reply"], "seen");
}

#[tokio::test]
async fn oversized_body_rejected_before_handler() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&webhook)
        .await;

    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let huge = format!(r#"{{"message":"{}"}}"#, "a".repeat(1_000_001));
    let response = client
        .post(server.url("/api/chat"))
        .header("Content-Type", "application/json")
        .body(huge)
        .send()
        .await
        .expect("oversized request should complete");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reports_cache_occupancy() {
    let webhook = MockServer::start().await;
    let server = RelayTestServer::start(&webhook.uri(), 8000).await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health request should complete");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("health response should be json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cachedHeaders"], 0);
}
