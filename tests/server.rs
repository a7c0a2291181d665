//! Integration tests for routing, the proxy pipeline, and CORS, using a
//! counting mock in place of the upstream client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;

use lightrelay::config::Settings;
use lightrelay::error::{UpstreamError, UpstreamErrorKind};
use lightrelay::health::PingResponse;
use lightrelay::proxy::upstream::{Upstream, UpstreamRequest, UpstreamResponse};
use lightrelay::server::{self, AppState};

const ORIGIN: &str = "https://app.example.com";

struct MockUpstream {
    calls: AtomicUsize,
    seen: Mutex<Vec<UpstreamRequest>>,
    reply: Result<UpstreamResponse, UpstreamError>,
}

impl MockUpstream {
    fn ok(body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("content-length", HeaderValue::from(body.len()));
        headers.insert("etag", HeaderValue::from_static("\"rev-7\""));
        headers.insert("set-cookie", HeaderValue::from_static("_d2id=tracker"));
        headers.insert("x-internal", HeaderValue::from_static("secret"));
        Self::with_reply(Ok(UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(body.as_bytes()),
            final_url: "https://api.mercadolibre.com/items/MLB123".into(),
        }))
    }

    fn failing(kind: UpstreamErrorKind, detail: &str) -> Self {
        Self::with_reply(Err(UpstreamError::new(kind, detail)))
    }

    fn with_reply(reply: Result<UpstreamResponse, UpstreamError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            reply,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last(&self) -> UpstreamRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request);
        self.reply.clone()
    }
}

async fn start_test_server(
    settings: Settings,
    upstream: Arc<MockUpstream>,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(AppState {
        settings: Arc::new(settings),
        upstream,
    });
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .get(format!("http://{addr}/_health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(resp.text().await.unwrap(), "ok");
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn ping_echoes_request_metadata() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock).await;

    let resp = client()
        .get(format!("http://{addr}/ping?a=1&b=2"))
        .header("origin", ORIGIN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], ORIGIN);
    let ping: PingResponse = resp.json().await.unwrap();
    assert!(ping.ok);
    assert_eq!(ping.origin.as_deref(), Some(ORIGIN));
    assert_eq!(ping.path, "/ping");
    assert_eq!(ping.qs, "a=1&b=2");

    let resp = client()
        .get(format!("http://{addr}/ping"))
        .send()
        .await
        .unwrap();
    let ping: PingResponse = resp.json().await.unwrap();
    assert!(ping.origin.is_none());
    assert_eq!(ping.qs, "");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn preflight_is_204_with_cors_and_no_body() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    for path in ["/", "/https://api.mercadolibre.com/items/MLB1", "/ping"] {
        let resp = client()
            .request(reqwest::Method::OPTIONS, format!("http://{addr}{path}"))
            .header("origin", ORIGIN)
            .header("access-control-request-method", "GET")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204, "path {path}");
        let headers = resp.headers();
        assert_eq!(headers["access-control-allow-origin"], ORIGIN);
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(
            headers["access-control-allow-methods"],
            "PUT, GET, POST, DELETE, OPTIONS"
        );
        assert_eq!(headers["access-control-max-age"], "86400");
        assert_eq!(
            headers["vary"],
            "Origin, Access-Control-Request-Headers, Access-Control-Request-Method"
        );
        assert!(resp.bytes().await.unwrap().is_empty());
    }
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn missing_target_returns_usage_hint() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    for url in [
        format!("http://{addr}/"),
        format!("http://{addr}/?u="),
        format!("http://{addr}/?u=%20%20"),
        format!("http://{addr}/?other=1"),
    ] {
        let resp = client().get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{url}");
        assert!(resp.text().await.unwrap().starts_with("OK - use"));
    }
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn disallowed_host_is_rejected_without_upstream_call() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    for url in [
        format!("http://{addr}/http://evil.com/anything"),
        format!("http://{addr}/?u=http://evil.com/anything"),
        format!("http://{addr}/https%3A%2F%2Fnotmercadolibre.com%2F"),
        format!("http://{addr}/?u=https://api.mercadolibre.com.evil.com/items"),
        format!("http://{addr}/?u=ftp://api.mercadolibre.com/file"),
        format!("http://{addr}/favicon.ico"),
    ] {
        let resp = client()
            .get(&url)
            .header("origin", ORIGIN)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{url}");
        assert_eq!(resp.headers()["access-control-allow-origin"], ORIGIN);
        assert_eq!(resp.text().await.unwrap(), "Host not allowed");
    }
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn path_style_target_reattaches_query() {
    let mock = Arc::new(MockUpstream::ok("{\"id\":\"MLB123\"}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .get(format!(
            "http://{addr}/https%3A%2F%2Fapi.mercadolibre.com%2Fitems%2FMLB123?x=1"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-proxy-fwd-query"], "x=1");
    assert_eq!(
        mock.last().url,
        "https://api.mercadolibre.com/items/MLB123?x=1"
    );
    assert_eq!(mock.last().method, reqwest::Method::GET);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn query_style_target_is_used_verbatim() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .get(format!(
            "http://{addr}/?u=https://api.mercadolibre.com/sites/MLB/search?q=tv"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("x-proxy-fwd-query").is_none());
    assert_eq!(
        mock.last().url,
        "https://api.mercadolibre.com/sites/MLB/search?q=tv"
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn get_relays_status_body_and_filtered_headers() {
    let mock = Arc::new(MockUpstream::ok("{\"id\":\"MLB123\"}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock).await;

    let resp = client()
        .get(format!("http://{addr}/https://api.mercadolibre.com/items/MLB123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let headers = resp.headers();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["etag"], "\"rev-7\"");
    assert_eq!(
        headers["x-proxy-final-url"],
        "https://api.mercadolibre.com/items/MLB123"
    );
    assert_eq!(headers["x-proxy-auth"], "0");
    assert!(headers.get("set-cookie").is_none());
    assert!(headers.get("x-internal").is_none());
    assert!(headers.get("x-proxy-static").is_none());
    assert_eq!(resp.text().await.unwrap(), "{\"id\":\"MLB123\"}");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn head_returns_headers_but_no_body() {
    let mock = Arc::new(MockUpstream::ok("{\"id\":\"MLB123\"}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .head(format!("http://{addr}/https://api.mercadolibre.com/items/MLB123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["etag"], "\"rev-7\"");
    assert!(resp.bytes().await.unwrap().is_empty());
    assert_eq!(mock.last().method, reqwest::Method::HEAD);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn upstream_error_status_is_relayed() {
    let mock = Arc::new(MockUpstream::with_reply(Ok(UpstreamResponse {
        status: StatusCode::NOT_FOUND,
        headers: HeaderMap::new(),
        body: Bytes::from_static(b"{\"message\":\"not_found\"}"),
        final_url: "https://api.mercadolibre.com/items/NOPE".into(),
    })));
    let (addr, shutdown) = start_test_server(Settings::default(), mock).await;

    let resp = client()
        .get(format!("http://{addr}/?u=https://api.mercadolibre.com/items/NOPE"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "{\"message\":\"not_found\"}");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn transport_timeout_is_502_json_with_cors() {
    let mock = Arc::new(MockUpstream::failing(
        UpstreamErrorKind::Timeout,
        "operation timed out",
    ));
    let (addr, shutdown) = start_test_server(Settings::default(), mock).await;

    let resp = client()
        .get(format!("http://{addr}/https://api.mercadolibre.com/items/MLB1"))
        .header("origin", ORIGIN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(resp.headers()["access-control-allow-origin"], ORIGIN);
    assert_eq!(resp.headers()["content-type"], "application/json");
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(body["detail"], "operation timed out");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn authorization_not_forwarded_by_default() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .get(format!("http://{addr}/https://api.mercadolibre.com/users/me"))
        .header("authorization", "Bearer APP_USR-secret")
        .header("cookie", "session=1")
        .header("x-custom", "1")
        .header("if-none-match", "\"rev-6\"")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-proxy-auth"], "0");

    let seen = mock.last().headers;
    assert!(seen.get("authorization").is_none());
    assert!(seen.get("cookie").is_none());
    assert!(seen.get("x-custom").is_none());
    assert_eq!(seen["if-none-match"], "\"rev-6\"");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn authorization_forwarded_when_enabled() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let settings = Settings {
        forward_auth: true,
        ..Settings::default()
    };
    let (addr, shutdown) = start_test_server(settings, mock.clone()).await;

    let resp = client()
        .get(format!("http://{addr}/https://api.mercadolibre.com/users/me"))
        .header("authorization", "Bearer APP_USR-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-proxy-auth"], "1");
    assert_eq!(mock.last().headers["authorization"], "Bearer APP_USR-secret");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn identical_requests_each_reach_upstream() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let url = format!("http://{addr}/https://api.mercadolibre.com/items/MLB123");
    for _ in 0..2 {
        let resp = client().get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(mock.calls(), 2);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unsupported_method_is_405_with_cors() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock.clone()).await;

    let resp = client()
        .post(format!("http://{addr}/https://api.mercadolibre.com/items"))
        .header("origin", ORIGIN)
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(resp.headers()["access-control-allow-origin"], ORIGIN);
    assert_eq!(mock.calls(), 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let mock = Arc::new(MockUpstream::ok("{}"));
    let (addr, shutdown) = start_test_server(Settings::default(), mock).await;

    let url = format!("http://{addr}/_health");
    assert!(client().get(&url).send().await.is_ok());

    let _ = shutdown.send(());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let result = client().get(&url).send().await;
    assert!(result.is_err());
}
