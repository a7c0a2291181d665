//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, health), and their associated argument
//! structs. Every relay setting has an environment variable equivalent
//! so container deployments configure the process without flags.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Parser)]
#[command(
    name = "lightrelay",
    version,
    about = "Allowlisted CORS forwarding proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        lightrelay run                       Listen on 0.0.0.0:8081\n  \
        lightrelay run -p 9000 --pretty      Local dev mode\n  \
        lightrelay validate                  Check LR_* settings without starting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Validate settings from flags and environment without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        lightrelay run                                     Defaults from LR_* env\n  \
        lightrelay run --use-proxy --proxy-url http://p:3128\n  \
        lightrelay run --read-timeout 30 --log-requests")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8081)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "LR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[command(flatten)]
    pub relay: RelayArgs,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

/// Relay settings shared by `run` and `validate`.
#[derive(Args, Clone, Debug)]
pub struct RelayArgs {
    /// Upstream connect timeout in seconds
    #[arg(
        long,
        env = "LR_CONNECT_TIMEOUT",
        default_value_t = 3.5,
        help_heading = "Upstream"
    )]
    pub connect_timeout: f64,

    /// Upstream read timeout in seconds
    #[arg(
        long,
        env = "LR_READ_TIMEOUT",
        default_value_t = 10.0,
        help_heading = "Upstream"
    )]
    pub read_timeout: f64,

    /// Number of upstream hosts the connection pool is sized for
    #[arg(
        long,
        env = "LR_POOL_CONNECTIONS",
        default_value_t = 50,
        help_heading = "Upstream"
    )]
    pub pool_connections: usize,

    /// Idle connections kept per upstream host for reuse
    #[arg(
        long,
        env = "LR_POOL_MAXSIZE",
        default_value_t = 100,
        help_heading = "Upstream"
    )]
    pub pool_maxsize: usize,

    /// Route every upstream call through --proxy-url
    #[arg(
        long,
        env = "LR_USE_PROXY",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        help_heading = "Upstream"
    )]
    pub use_proxy: bool,

    /// Static upstream proxy URL (credentials allowed, never exposed)
    #[arg(long, env = "LR_PROXY_URL", help_heading = "Upstream")]
    pub proxy_url: Option<String>,

    /// Forward the caller's Authorization header upstream
    #[arg(
        long,
        env = "LR_FORWARD_AUTH",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        help_heading = "Upstream"
    )]
    pub forward_auth: bool,

    /// Outbound User-Agent when the caller sends none
    #[arg(
        long,
        env = "LR_USER_AGENT",
        default_value = DEFAULT_USER_AGENT,
        help_heading = "Upstream"
    )]
    pub user_agent: String,

    /// Stop following redirects at the first hop outside the allowlist
    #[arg(
        long,
        env = "LR_REDIRECT_ALLOWLIST_ONLY",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        help_heading = "Upstream"
    )]
    pub redirect_allowlist_only: bool,

    /// Log one line per proxied request
    #[arg(
        long,
        env = "LR_LOG",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub log_requests: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub relay: RelayArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8081")]
    pub url: String,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
