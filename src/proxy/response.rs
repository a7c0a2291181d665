//! Response assembly for every proxy outcome.
//!
//! CORS headers are not set here; the [`cors`](crate::middleware::cors)
//! layer attaches them to every response on the way out.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::headers::filter_response_headers;
use super::upstream::UpstreamResponse;
use crate::config::StaticProxy;
use crate::error::UpstreamError;

pub const X_PROXY_FINAL_URL: HeaderName = HeaderName::from_static("x-proxy-final-url");
pub const X_PROXY_FWD_QUERY: HeaderName = HeaderName::from_static("x-proxy-fwd-query");
pub const X_PROXY_STATIC: HeaderName = HeaderName::from_static("x-proxy-static");
pub const X_PROXY_AUTH: HeaderName = HeaderName::from_static("x-proxy-auth");

pub const USAGE_HINT: &str = "OK - use /https://<url> or ?u=<url>";
pub const HOST_NOT_ALLOWED: &str = "Host not allowed";

/// Per-request facts echoed back as debug headers.
#[derive(Debug, Clone, Copy)]
pub struct DebugInfo<'a> {
    pub static_proxy: Option<&'a StaticProxy>,
    pub forwarded_query: Option<&'a str>,
    pub auth_forwarded: bool,
}

impl DebugInfo<'_> {
    fn apply(&self, headers: &mut HeaderMap) {
        if let Some(proxy) = self.static_proxy {
            insert_str(headers, X_PROXY_STATIC, &proxy.masked());
        }
        if let Some(query) = self.forwarded_query {
            insert_str(headers, X_PROXY_FWD_QUERY, query);
        }
        headers.insert(
            X_PROXY_AUTH,
            HeaderValue::from_static(if self.auth_forwarded { "1" } else { "0" }),
        );
    }
}

fn insert_str(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(val) => {
            headers.insert(name, val);
        }
        Err(_) => {
            tracing::warn!(header = %name, "debug header value is not a valid header, skipping");
        }
    }
}

#[must_use]
pub fn usage() -> Response {
    (StatusCode::OK, USAGE_HINT).into_response()
}

#[must_use]
pub fn host_not_allowed() -> Response {
    (StatusCode::BAD_REQUEST, HOST_NOT_ALLOWED).into_response()
}

/// Relay a successful upstream exchange. HEAD responses never carry a body.
#[must_use]
pub fn relay(method: &Method, upstream: UpstreamResponse, debug: &DebugInfo<'_>) -> Response {
    let is_head = *method == Method::HEAD;
    let mut headers = filter_response_headers(&upstream.headers, is_head);
    insert_str(&mut headers, X_PROXY_FINAL_URL, &upstream.final_url);
    debug.apply(&mut headers);

    let body = if is_head {
        Body::empty()
    } else {
        Body::from(upstream.body)
    };

    (upstream.status, headers, body).into_response()
}

/// 502 with `{"error":"upstream_error","detail":...}`.
#[must_use]
pub fn upstream_failure(err: &UpstreamError, debug: &DebugInfo<'_>) -> Response {
    let mut headers = HeaderMap::new();
    debug.apply(&mut headers);
    (
        StatusCode::BAD_GATEWAY,
        headers,
        Json(serde_json::json!({
            "error": "upstream_error",
            "detail": err.detail,
        })),
    )
        .into_response()
}
