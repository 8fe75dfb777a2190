//! UI serving routes

use axum::{extract::State, response::Html};
use tracing::debug;

use crate::{ApiError, AppState};

const INDEX_HTML: &str = include_str!("../../ui/index.html");

/// GET /
///
/// Serves the configured page, read fresh on every request so it can be
/// edited without a restart. Falls back to the built-in player page.
pub async fn serve_index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    match &state.index_html {
        Some(path) => {
            debug!("Serving index page from {}", path.display());
            let page = tokio::fs::read_to_string(path)
                .await
                .map_err(qtfm_common::Error::from)?;
            Ok(Html(page))
        }
        None => Ok(Html(INDEX_HTML.to_string())),
    }
}
