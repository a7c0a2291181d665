//! Target URL resolution from the inbound path or `u` query parameter.
//!
//! Two request shapes are supported:
//!
//! - path style: `/https%3A%2F%2Fapi.mercadolibre.com%2Fitems%2FMLB1?x=1`.
//!   The path after the leading `/` is percent-decoded once and the
//!   inbound query string is re-appended, because the embedded URL's own
//!   query ends up in the outer request's query string.
//! - query style: `/?u=https://api.mercadolibre.com/sites/MLB/search?q=tv`.

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub url: String,
    /// Inbound query re-appended to a path-style target. `None` for query style.
    pub forwarded_query: Option<String>,
}

/// Resolve the upstream target. `None` means the caller supplied nothing.
#[must_use]
pub fn resolve_target(path: &str, query: Option<&str>) -> Option<ResolvedTarget> {
    let raw = path.strip_prefix('/').unwrap_or(path);
    let query = query.unwrap_or("");

    if !raw.is_empty() {
        let mut url = percent_decode_str(raw).decode_utf8_lossy().into_owned();
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(query);
        }
        if url.is_empty() {
            return None;
        }
        return Some(ResolvedTarget {
            url,
            forwarded_query: Some(query.to_string()),
        });
    }

    let url = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default();

    if url.is_empty() {
        None
    } else {
        Some(ResolvedTarget {
            url,
            forwarded_query: None,
        })
    }
}
