//! Health endpoint
//!
//! Reports the build and the upstream and signing settings the server is
//! running with, without calling upstream.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
    /// Directory endpoint `/regions` and `/radios/:cid` are read from
    pub upstream: String,
    /// Host signed stream URLs point at
    pub stream_base_url: String,
    /// Lifetime of URLs handed out by `/mp3/:id`
    pub url_ttl_secs: i64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        build_profile: env!("BUILD_PROFILE"),
        upstream: state.directory.endpoint().to_string(),
        stream_base_url: state.signer.base_url().to_string(),
        url_ttl_secs: state.signer.ttl_secs(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
