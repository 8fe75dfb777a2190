//! qtfm-server library - station directory proxy and stream URL signer
//!
//! Routes:
//! - `GET /` static player page
//! - `GET /regions` region list (JSON)
//! - `GET /radios/:cid` stations of one region (JSON)
//! - `GET /mp3/:id` signed stream URL (text)
//! - `GET /health` build, upstream and signing settings

use axum::Router;
use qtfm_common::config::TomlConfig;
use qtfm_common::{Clock, DirectoryClient, StationDirectory, StreamSigner, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::ApiError;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream station directory
    pub directory: Arc<dyn StationDirectory>,
    pub signer: Arc<StreamSigner>,
    /// Time source for `/mp3/:id`
    pub clock: Arc<dyn Clock>,
    /// Page served at `/`; the built-in page when `None`
    pub index_html: Option<PathBuf>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        directory: Arc<dyn StationDirectory>,
        signer: StreamSigner,
        clock: Arc<dyn Clock>,
        index_html: Option<PathBuf>,
    ) -> Self {
        Self {
            directory,
            signer: Arc::new(signer),
            clock,
            index_html,
        }
    }

    /// Production state: real upstream client and wall clock
    pub fn from_config(config: &TomlConfig) -> qtfm_common::Result<Self> {
        let directory = DirectoryClient::new(&config.upstream)?;
        let signer = StreamSigner::new(&config.signing)?;
        Ok(Self::new(
            Arc::new(directory),
            signer,
            Arc::new(SystemClock),
            config.server.index_html.clone(),
        ))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/regions", get(api::get_regions))
        .route("/radios/:cid", get(api::get_radios))
        .route("/mp3/:id", get(api::get_mp3_url))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
