//! HTTP error mapping
//!
//! Bad region ids are the client's fault (400); every other failure,
//! upstream or local, is reported as a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use qtfm_common::Error;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by API handlers
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Rejected request: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
