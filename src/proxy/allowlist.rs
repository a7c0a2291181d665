//! Upstream host allowlist.
//!
//! A target is admitted when its scheme is `http` or `https` and its
//! lowercased host either equals an exact entry or ends with a suffix
//! entry. Suffixes keep their leading dot so `evilmercadolibre.com`
//! never matches `.mercadolibre.com`.

use url::Url;

const EXACT_HOSTS: &[&str] = &["api.mercadolibre.com"];
const DOMAIN_SUFFIXES: &[&str] = &[".mercadolivre.com.br", ".mercadolibre.com"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowlist {
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl Default for Allowlist {
    fn default() -> Self {
        Self::new(EXACT_HOSTS, DOMAIN_SUFFIXES)
    }
}

impl Allowlist {
    /// Entries are lowercased. Suffixes without a leading dot get one.
    #[must_use]
    pub fn new(exact: &[&str], suffixes: &[&str]) -> Self {
        Self {
            exact: exact.iter().map(|h| h.to_ascii_lowercase()).collect(),
            suffixes: suffixes
                .iter()
                .map(|s| {
                    let s = s.to_ascii_lowercase();
                    if s.starts_with('.') {
                        s
                    } else {
                        format!(".{s}")
                    }
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn exact(&self) -> &[String] {
        &self.exact
    }

    #[must_use]
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Admit or deny `target`. Unparsable input is denied, never an error.
    #[must_use]
    pub fn is_allowed(&self, target: &str) -> bool {
        let Ok(url) = Url::parse(target) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        self.allows_host(&host)
    }

    #[must_use]
    pub fn allows_host(&self, host: &str) -> bool {
        if self.exact.iter().any(|h| h == host) {
            return true;
        }
        self.suffixes.iter().any(|suffix| host.ends_with(suffix.as_str()))
    }
}
