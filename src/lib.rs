//! lightrelay is an allowlisted CORS forwarding proxy.
//!
//! It lets a browser frontend call the MercadoLibre API without tripping
//! cross-origin restrictions. Callers embed the target URL in the request
//! path (`/https://api.mercadolibre.com/items/MLB1`) or in the `u` query
//! parameter; the relay checks the host against a fixed allowlist,
//! forwards GET/HEAD with a curated header set, and returns the upstream
//! response with permissive CORS headers.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, health).
//! - [`config`] -- Typed, validated, init-only relay settings.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /_health` and `GET /ping` handlers.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- CORS layer applied to every response.
//! - [`proxy`] -- Target resolution, allowlist, header translation, the
//!   upstream client, and response assembly.
//! - [`server`] -- Axum server setup, shared application state, and
//!   graceful shutdown.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
