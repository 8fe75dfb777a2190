//! # QingTing FM Common Library
//!
//! Shared code for the qtfm server and command-line tool:
//! - Stream URL signing (HMAC-MD5 over a canonical query string)
//! - Clock abstraction for deterministic signing
//! - Upstream station directory client
//! - Configuration loading
//! - Common error type

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod signer;

/// Re-exported so implementors of [`StationDirectory`] need not depend on axum
pub use axum::async_trait;
pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::{DirectoryClient, Region, RegionId, RegionObject, StationDirectory};
pub use error::{Error, Result};
pub use signer::{SignedUrl, StreamSigner};
