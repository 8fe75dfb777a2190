//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file resolved in this order:
//! 1. Explicit path (`--config` flag or `QTFM_CONFIG` environment variable)
//! 2. `<config_dir>/qtfm/config.toml` (e.g. `~/.config/qtfm/config.toml`)
//! 3. Built-in defaults
//!
//! A missing default file is not an error; an explicitly named file that
//! cannot be read or parsed is. Every table and key is optional.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the station id in [`SigningConfig::path_template`]
pub const STATION_ID_PLACEHOLDER: &str = "{id}";

/// Longest accepted signed URL lifetime (one year)
pub const MAX_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Root configuration document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this configuration was read from, `None` for built-in defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static page served at `/`. Read on every request; the built-in page
    /// is used when unset.
    #[serde(default)]
    pub index_html: Option<PathBuf>,
}

/// Stream URL signing settings
#[derive(Debug, Clone, Deserialize)]
pub struct SigningConfig {
    /// Shared HMAC key
    #[serde(default = "default_secret")]
    pub secret: String,

    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Scheme and host prepended to the stream path
    #[serde(default = "default_stream_base_url")]
    pub stream_base_url: String,

    /// Stream path, `{id}` is replaced by the station id
    #[serde(default = "default_path_template")]
    pub path_template: String,

    /// Lifetime of a signed URL in seconds, at most [`MAX_TTL_SECS`]
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

/// Upstream directory settings
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// GraphQL-style POST endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Page id whose `regions` field lists every region
    #[serde(default = "default_regions_page_cid")]
    pub regions_page_cid: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_secret() -> String {
    "Lwrpu$K5oP".to_string()
}

fn default_app_id() -> String {
    "web".to_string()
}

fn default_stream_base_url() -> String {
    "https://lhttp.qingting.fm".to_string()
}

fn default_path_template() -> String {
    "/live/{id}/64k.mp3".to_string()
}

fn default_ttl_secs() -> i64 {
    60 * 60
}

fn default_endpoint() -> String {
    "https://webbff.qtfm.cn/www".to_string()
}

fn default_regions_page_cid() -> u64 {
    432
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("qtfm/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index_html: None,
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            app_id: default_app_id(),
            stream_base_url: default_stream_base_url(),
            path_template: default_path_template(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            regions_page_cid: default_regions_page_cid(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TomlConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Resolve configuration: explicit path, then the per-user default file,
    /// then built-in defaults.
    ///
    /// Runs before logging is initialized, so callers report
    /// [`TomlConfig::source`] themselves.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values that would make signing or fetching meaningless
    pub fn validate(&self) -> Result<()> {
        if self.signing.secret.is_empty() {
            return Err(Error::Config("signing.secret must not be empty".to_string()));
        }
        if !self.signing.path_template.contains(STATION_ID_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "signing.path_template must contain {}",
                STATION_ID_PLACEHOLDER
            )));
        }
        check_ttl(self.signing.ttl_secs)?;
        if self.upstream.timeout_secs == 0 {
            return Err(Error::Config("upstream.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn check_ttl(ttl_secs: i64) -> Result<()> {
    if ttl_secs <= 0 || ttl_secs > MAX_TTL_SECS {
        return Err(Error::Config(format!(
            "signing.ttl_secs must be between 1 and {}, got {}",
            MAX_TTL_SECS, ttl_secs
        )));
    }
    Ok(())
}

/// Per-user configuration file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qtfm").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.index_html.is_none());
        assert_eq!(config.signing.secret, "Lwrpu$K5oP");
        assert_eq!(config.signing.app_id, "web");
        assert_eq!(config.signing.stream_base_url, "https://lhttp.qingting.fm");
        assert_eq!(config.signing.path_template, "/live/{id}/64k.mp3");
        assert_eq!(config.signing.ttl_secs, 3600);
        assert_eq!(config.upstream.endpoint, "https://webbff.qtfm.cn/www");
        assert_eq!(config.upstream.regions_page_cid, 432);
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_tables_keep_remaining_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [signing]
            path_template = "/live/{id}/24k.mp3"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.signing.path_template, "/live/{id}/24k.mp3");
        assert_eq!(config.signing.secret, "Lwrpu$K5oP");
    }

    #[test]
    fn test_bind_addr() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 80,
            index_html: None,
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:80");
    }

    #[test]
    fn test_rejects_empty_secret() {
        let err = TomlConfig::from_toml_str("[signing]\nsecret = \"\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let err = TomlConfig::from_toml_str("[signing]\npath_template = \"/live/64k.mp3\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("{id}"));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        assert!(TomlConfig::from_toml_str("[signing]\nttl_secs = 0\n").is_err());
        assert!(TomlConfig::from_toml_str("[signing]\nttl_secs = -5\n").is_err());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let at_limit = format!("[signing]\nttl_secs = {}\n", MAX_TTL_SECS);
        assert_eq!(
            TomlConfig::from_toml_str(&at_limit).unwrap().signing.ttl_secs,
            MAX_TTL_SECS
        );

        let result = TomlConfig::from_toml_str("[signing]\nttl_secs = 9223372036854775807\n");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("ttl_secs")));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(TomlConfig::from_toml_str("[upstream]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let err = TomlConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
