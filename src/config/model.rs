//! Typed relay settings.
//!
//! [`Settings`] is built once at startup from [`RelayArgs`](crate::cli::RelayArgs)
//! and never mutated afterwards. It holds upstream timeouts, pool sizing,
//! the optional static proxy, feature flags, and the host [`Allowlist`].

use std::time::Duration;

use url::Url;

use crate::proxy::allowlist::Allowlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Number of upstream hosts the pool is sized for. The client keeps one
    /// pool per host and does not cap how many hosts it tracks; the
    /// allowlist already bounds that, so this is validated and reported only.
    pub max_connections: usize,
    /// Idle connections kept open per upstream host for reuse. Busy
    /// connections are not capped.
    pub max_per_route: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 50,
            max_per_route: 100,
        }
    }
}

/// Fixed intermediary for every upstream call. Environment proxies are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProxy {
    pub url: Url,
}

impl StaticProxy {
    /// `scheme://host[:port]`, dropping any userinfo, path, or query.
    #[must_use]
    pub fn masked(&self) -> String {
        mask_proxy_url(&self.url)
    }
}

#[must_use]
pub fn mask_proxy_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub pool: PoolSettings,
    pub static_proxy: Option<StaticProxy>,
    pub forward_auth: bool,
    pub log_requests: bool,
    /// Stop following redirects at the first hop outside the allowlist.
    pub redirect_allowlist_only: bool,
    pub user_agent: String,
    pub allowlist: Allowlist,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(3500),
            read_timeout: Duration::from_secs(10),
            pool: PoolSettings::default(),
            static_proxy: None,
            forward_auth: false,
            log_requests: false,
            redirect_allowlist_only: false,
            user_agent: crate::cli::DEFAULT_USER_AGENT.to_string(),
            allowlist: Allowlist::default(),
        }
    }
}
