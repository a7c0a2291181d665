//! Permissive CORS headers on every response.
//!
//! The inbound `Origin` is echoed when present, and only then are
//! credentials allowed; a wildcard origin is always paired with
//! `Access-Control-Allow-Credentials: false`. Preflight answers use a
//! fixed superset of methods and headers rather than echoing the
//! browser's `Access-Control-Request-*` values.

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN,
    VARY,
};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

pub const ALLOW_METHODS: &str = "PUT, GET, POST, DELETE, OPTIONS";

pub const ALLOW_HEADERS: &str =
    "Content-Type, Authorization, If-None-Match, If-Modified-Since, Range, Cache-Control, Pragma";

pub const EXPOSE_HEADERS: &str = "content-type,content-length,connection,date,access-control-max-age,\
     x-api-server-segment,x-content-type-options,x-request-id,strict-transport-security,\
     x-frame-options,x-xss-protection,access-control-allow-origin,access-control-allow-headers,\
     access-control-allow-methods,x-cache,via,x-amz-cf-pop,x-amz-cf-id,\
     X-Proxy-Final-Url,X-Proxy-Fwd-Query,X-Proxy-Static,X-Proxy-Auth";

pub const MAX_AGE_SECS: &str = "86400";

pub const VARY_VALUE: &str = "Origin, Access-Control-Request-Headers, Access-Control-Request-Method";

pub async fn cors(req: Request, next: Next) -> Response {
    let origin = req.headers().get(ORIGIN).cloned();
    let mut response = next.run(req).await;
    apply_cors(response.headers_mut(), origin.as_ref());
    response
}

/// Overwrite the CORS headers on `headers`, including any relayed `Vary`.
pub fn apply_cors(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    match origin.filter(|o| !o.is_empty()) {
        Some(origin) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        None => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("false"),
            );
        }
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    headers.insert(VARY, HeaderValue::from_static(VARY_VALUE));
}
