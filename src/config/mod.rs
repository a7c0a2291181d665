//! Static relay configuration.
//!
//! Settings are read once from flags and environment variables (see
//! [`RelayArgs`]), validated in one pass by [`validation::validate`],
//! and frozen into a [`Settings`] value that lives for the whole process.

pub mod model;
pub mod validation;

use std::time::Duration;

pub use model::{PoolSettings, Settings, StaticProxy};

use crate::cli::RelayArgs;
use crate::error::RelayError;
use crate::proxy::allowlist::Allowlist;

impl Settings {
    /// Validate `args` and convert them into typed settings.
    pub fn from_args(args: &RelayArgs) -> Result<Self, RelayError> {
        validation::validate(args).map_err(|errors| RelayError::ConfigValidation { errors })?;

        let static_proxy = if args.use_proxy {
            let raw = args.proxy_url.as_deref().map(str::trim).unwrap_or("");
            let url = validation::validate_proxy_url(raw).map_err(|message| {
                RelayError::ConfigValidation {
                    errors: vec![crate::error::ValidationError {
                        field: "LR_PROXY_URL".into(),
                        message,
                        suggestion: None,
                    }],
                }
            })?;
            Some(StaticProxy { url })
        } else {
            None
        };

        Ok(Self {
            connect_timeout: Duration::from_secs_f64(args.connect_timeout),
            read_timeout: Duration::from_secs_f64(args.read_timeout),
            pool: PoolSettings {
                max_connections: args.pool_connections,
                max_per_route: args.pool_maxsize,
            },
            static_proxy,
            forward_auth: args.forward_auth,
            log_requests: args.log_requests,
            redirect_allowlist_only: args.redirect_allowlist_only,
            user_agent: args.user_agent.clone(),
            allowlist: Allowlist::default(),
        })
    }
}
