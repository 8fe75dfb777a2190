//! Common error types for qtfm

use thiserror::Error;

/// Common result type for qtfm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the qtfm crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error (wraps toml::de::Error)
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Transport-level failure talking to the upstream directory
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream error {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Upstream response did not have the expected shape
    #[error("Unexpected upstream response: missing {0}")]
    UpstreamShape(String),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
