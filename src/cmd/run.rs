//! `lightrelay run` — start the proxy server.
//!
//! Validates settings, builds the shared upstream client once, and
//! serves the Axum router until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::Settings;
use crate::error::RelayError;
use crate::logging;
use crate::server::{self, AppState};

#[allow(clippy::cast_possible_truncation)]
pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let settings = Settings::from_args(&args.relay)?;
    let masked_proxy = settings.static_proxy.as_ref().map(|p| p.masked());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    tracing::info!(
        connect_timeout_ms = settings.connect_timeout.as_millis() as u64,
        read_timeout_ms = settings.read_timeout.as_millis() as u64,
        pool_connections = settings.pool.max_connections,
        pool_per_host = settings.pool.max_per_route,
        static_proxy = masked_proxy.as_deref().unwrap_or("none"),
        forward_auth = settings.forward_auth,
        redirect_allowlist_only = settings.redirect_allowlist_only,
        "settings loaded"
    );

    let state = Arc::new(AppState::new(settings)?);
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "lightrelay started");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("lightrelay stopped");
    Ok(())
}
