//! Core HTTP forwarding handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every request outside `/_health` and `/ping`. Each request runs the
//! same linear pipeline: resolve the target ([`target`]), check it against
//! the [`allowlist`], build outbound headers ([`headers`]), call the
//! [`upstream`], and assemble the reply ([`response`]).

pub mod allowlist;
pub mod headers;
pub mod response;
pub mod target;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::server::AppState;
use response::DebugInfo;
use upstream::UpstreamRequest;

/// Preflight answer: 204 with no body. CORS headers come from the middleware.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[allow(clippy::cast_possible_truncation)]
pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
) -> Response {
    match method {
        Method::OPTIONS => return preflight_handler().await.into_response(),
        Method::GET | Method::HEAD => {}
        _ => {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, HeaderValue::from_static("GET, HEAD, OPTIONS"))],
            )
                .into_response();
        }
    }

    let settings = &state.settings;

    let Some(resolved) = target::resolve_target(uri.path(), uri.query()) else {
        return response::usage();
    };

    if !settings.allowlist.is_allowed(&resolved.url) {
        tracing::debug!(method = %method, target = %resolved.url, "target host not allowed");
        return response::host_not_allowed();
    }

    let request_id = uuid::Uuid::new_v4();
    if settings.log_requests {
        let origin = req_headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info!(
            request_id = %request_id,
            client_ip = %addr.ip(),
            method = %method,
            target = %resolved.url,
            origin = %origin,
            "proxying request"
        );
    }

    let outbound =
        headers::build_outbound_headers(&req_headers, &settings.user_agent, settings.forward_auth);
    let debug = DebugInfo {
        static_proxy: settings.static_proxy.as_ref(),
        forwarded_query: resolved.forwarded_query.as_deref(),
        auth_forwarded: outbound.auth_forwarded,
    };

    let start = Instant::now();
    let result = state
        .upstream
        .send(UpstreamRequest {
            method: method.clone(),
            url: resolved.url.clone(),
            headers: outbound.headers,
        })
        .await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(upstream_response) => {
            if settings.log_requests {
                tracing::info!(
                    request_id = %request_id,
                    status = upstream_response.status.as_u16(),
                    final_url = %upstream_response.final_url,
                    latency_ms,
                    "upstream responded"
                );
            }
            response::relay(&method, upstream_response, &debug)
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                target = %resolved.url,
                kind = e.kind.as_str(),
                error = %e,
                latency_ms,
                "upstream request failed"
            );
            response::upstream_failure(&e, &debug)
        }
    }
}
