//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding settings and
//! the upstream client), [`build_upstream`] for the connection-pooled
//! client, [`build_router`] for the Axum router with its middleware
//! layers, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::RelayError;
use crate::health::{health_handler, ping_handler};
use crate::middleware::cors::cors;
use crate::proxy::upstream::{ReqwestUpstream, Upstream};
use crate::proxy::{self, preflight_handler};

pub struct AppState {
    pub settings: Arc<Settings>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, RelayError> {
        let upstream = build_upstream(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            upstream,
        })
    }
}

/// Build the process-wide upstream client. Called once at startup.
pub fn build_upstream(settings: &Settings) -> Result<Arc<dyn Upstream>, RelayError> {
    Ok(Arc::new(ReqwestUpstream::new(settings)?))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/_health",
            get(health_handler).options(preflight_handler),
        )
        .route("/ping", get(ping_handler).options(preflight_handler))
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(cors)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
