//! HTTP API handlers for qtfm-server

pub mod directory;
pub mod health;
pub mod stream;
pub mod ui;

pub use directory::{get_radios, get_regions};
pub use health::health_routes;
pub use stream::get_mp3_url;
pub use ui::serve_index;
