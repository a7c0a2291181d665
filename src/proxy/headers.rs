//! Outbound header construction and response header filtering.
//!
//! [`build_outbound_headers`] starts from browser-like defaults and
//! overlays a fixed allow-list of inbound headers. Nothing outside that
//! list reaches the upstream: cookies, custom headers and hop-by-hop
//! headers are dropped by omission. `Authorization` is copied only when
//! the forward-auth flag is set.
//!
//! [`filter_response_headers`] keeps only the upstream response headers
//! a browser client needs, minus hop-by-hop headers.

use std::sync::LazyLock;

use axum::http::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, CONNECTION, CONTENT_TYPE,
    IF_MODIFIED_SINCE, IF_NONE_MATCH, PRAGMA, RANGE, USER_AGENT,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

const DEFAULT_ACCEPT: &str = "*/*";
const DEFAULT_ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Inbound headers that may override the defaults.
pub static FORWARDED_REQUEST_HEADERS: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    vec![
        ACCEPT,
        ACCEPT_LANGUAGE,
        USER_AGENT,
        RANGE,
        IF_NONE_MATCH,
        IF_MODIFIED_SINCE,
        CACHE_CONTROL,
        PRAGMA,
        CONTENT_TYPE,
    ]
});

static RELAYED_RESPONSE_HEADERS: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "content-type",
        "cache-control",
        "etag",
        "last-modified",
        "content-range",
        "accept-ranges",
        "location",
        "vary",
        "content-length",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailers",
        "transfer-encoding",
        "upgrade",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Outbound headers plus whether `Authorization` made it in.
#[derive(Debug, Clone)]
pub struct OutboundHeaders {
    pub headers: HeaderMap,
    pub auth_forwarded: bool,
}

pub fn build_outbound_headers(
    inbound: &HeaderMap,
    user_agent: &str,
    forward_auth: bool,
) -> OutboundHeaders {
    let mut headers = HeaderMap::new();

    match HeaderValue::from_str(user_agent) {
        Ok(val) => {
            headers.insert(USER_AGENT, val);
        }
        Err(_) => {
            tracing::warn!("configured user agent is not a valid header value, skipping");
        }
    }
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    for name in FORWARDED_REQUEST_HEADERS.iter() {
        if let Some(value) = non_empty(inbound, name) {
            headers.insert(name.clone(), value.clone());
        }
    }

    let mut auth_forwarded = false;
    if forward_auth {
        if let Some(value) = non_empty(inbound, &AUTHORIZATION) {
            headers.insert(AUTHORIZATION, value.clone());
            auth_forwarded = true;
        }
    }

    OutboundHeaders {
        headers,
        auth_forwarded,
    }
}

fn non_empty<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a HeaderValue> {
    headers.get(name).filter(|v| !v.is_empty())
}

/// Copy the relayable subset of an upstream response's headers.
///
/// `keep_content_length` is false when the body is relayed in full, in
/// which case the length is recomputed from the bytes actually sent.
pub fn filter_response_headers(upstream: &HeaderMap, keep_content_length: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if is_hop_by_hop(name) || !RELAYED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        if name == axum::http::header::CONTENT_LENGTH && !keep_content_length {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
