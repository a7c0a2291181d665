//! The upstream call.
//!
//! [`Upstream`] is the seam between the request pipeline and the network.
//! [`ReqwestUpstream`] is the production implementation: a single
//! `reqwest::Client` built once at startup and shared by every request.
//!
//! Client policy:
//! - environment proxies are ignored; only the configured static proxy applies
//! - no cookie store, so `Set-Cookie` from one response never reaches another request
//! - redirects are followed, up to [`MAX_REDIRECTS`]; with
//!   `redirect_allowlist_only` a hop off the allowlist stops the chain and
//!   its 3xx is relayed as-is
//! - exactly one attempt per request, no retries
//! - independent connect and read timeouts
//! - idle connections kept per host capped by the per-route pool size;
//!   no admission control on top of the transport's own pool

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;

use super::allowlist::Allowlist;
use crate::config::Settings;
use crate::error::{RelayError, UpstreamError, UpstreamErrorKind};

pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// URL the response actually came from, after redirects.
    pub final_url: String,
}

// async_trait keeps Upstream object-safe so AppState can hold an Arc<dyn Upstream>.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

#[derive(Debug)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new(settings: &Settings) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .pool_max_idle_per_host(settings.pool.max_per_route)
            .pool_idle_timeout(Duration::from_secs(30))
            .redirect(redirect_policy(settings));

        if let Some(ref proxy) = settings.static_proxy {
            let proxy = reqwest::Proxy::all(proxy.url.as_str()).map_err(RelayError::HttpClient)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(RelayError::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .request(request.method, request.url.as_str())
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| UpstreamError::from_chain(classify(&e), &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| match classify(&e) {
                UpstreamErrorKind::Timeout => UpstreamError::from_chain(UpstreamErrorKind::Timeout, &e),
                _ => UpstreamError::from_chain(UpstreamErrorKind::Body, &e),
            })?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
            final_url,
        })
    }
}

fn redirect_policy(settings: &Settings) -> reqwest::redirect::Policy {
    if !settings.redirect_allowlist_only {
        return reqwest::redirect::Policy::limited(MAX_REDIRECTS);
    }
    let allowlist: Allowlist = settings.allowlist.clone();
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if allowlist.is_allowed(attempt.url().as_str()) {
            attempt.follow()
        } else {
            tracing::debug!(location = %attempt.url(), "redirect leaves the allowlist, not following");
            attempt.stop()
        }
    })
}

fn classify(err: &reqwest::Error) -> UpstreamErrorKind {
    if err.is_timeout() {
        UpstreamErrorKind::Timeout
    } else if err.is_connect() {
        UpstreamErrorKind::Connect
    } else if err.is_body() || err.is_decode() {
        UpstreamErrorKind::Body
    } else {
        UpstreamErrorKind::Request
    }
}
