//! Signed stream URL endpoint

use axum::extract::{Path, State};
use tracing::info;

use crate::AppState;

/// GET /mp3/:id
///
/// Returns the signed stream URL for station `id` as plain text. The id is
/// not validated; whatever was requested is signed.
pub async fn get_mp3_url(State(state): State<AppState>, Path(id): Path<String>) -> String {
    let signed = state.signer.sign(&id, state.clock.now());
    info!(station = %id, expires_at = signed.expires_at(), "Issued signed stream URL");
    signed.into_string()
}
