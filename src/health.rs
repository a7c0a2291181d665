//! `GET /_health` and `GET /ping` handlers.
//!
//! `/_health` is a bare liveness probe. `/ping` echoes request metadata
//! so a frontend can check CORS and connectivity without touching the
//! upstream API.

use axum::http::{header, HeaderMap, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const HEALTH_BODY: &str = "ok";

pub async fn health_handler() -> &'static str {
    HEALTH_BODY
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub ok: bool,
    pub origin: Option<String>,
    pub path: String,
    pub qs: String,
}

pub async fn ping_handler(uri: Uri, headers: HeaderMap) -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        origin: headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        path: uri.path().to_string(),
        qs: uri.query().unwrap_or("").to_string(),
    })
}
