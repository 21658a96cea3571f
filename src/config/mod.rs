//! Configuration module for Pulseboard
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PULSEBOARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use pulseboard::config::PulseboardConfig;
//!
//! let toml = r#"
//! [upstream]
//! base_url = "https://probe.example.com"
//! "#;
//! let config: PulseboardConfig = toml::from_str(toml).unwrap();
//! assert_eq!(
//!     config.stream_url().unwrap(),
//!     "wss://probe.example.com/api/v1/ws/server"
//! );
//! ```

pub mod error;
pub mod logging;
pub mod server;
pub mod stream;
pub mod upstream;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use stream::{BackoffConfig, BackoffKind, StreamConfig};
pub use upstream::UpstreamConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Unified configuration for the dashboard server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PulseboardConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Probe backend used by the proxy and for the default stream URL
    pub upstream: UpstreamConfig,
    /// Snapshot stream and history settings
    pub stream: StreamConfig,
    pub logging: LoggingConfig,
}

impl PulseboardConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `PULSEBOARD_*` environment overrides.
    ///
    /// Unparsable values are ignored and the previous value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("PULSEBOARD_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("PULSEBOARD_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("PULSEBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PULSEBOARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(url) = std::env::var("PULSEBOARD_UPSTREAM_URL") {
            self.upstream.base_url = Some(url);
        }
        if let Ok(url) = std::env::var("PULSEBOARD_STREAM_URL") {
            self.stream.url = Some(url);
        }

        self
    }

    /// Resolved stream endpoint.
    pub fn stream_url(&self) -> Result<String, ConfigError> {
        self.stream.resolve_url(&self.upstream).ok_or_else(|| {
            ConfigError::MissingField("stream.url or upstream.base_url".to_string())
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }

        if self.stream.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "stream.history_capacity",
                "must keep at least one snapshot",
            ));
        }

        let backoff = &self.stream.backoff;
        if backoff.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "stream.backoff.max_attempts",
                "must be greater than zero",
            ));
        }
        if backoff.base_ms == 0 {
            return Err(ConfigError::invalid(
                "stream.backoff.base_ms",
                "must be greater than zero",
            ));
        }
        if backoff.cap_ms < backoff.base_ms {
            return Err(ConfigError::invalid(
                "stream.backoff.cap_ms",
                format!("must be at least base_ms ({})", backoff.base_ms),
            ));
        }

        if let Some((field, value)) = self.logging.invalid_level() {
            return Err(ConfigError::invalid(
                &field,
                format!("unknown log level '{}'", value),
            ));
        }

        if let Some(raw) = self.stream.url.as_deref() {
            let url = Url::parse(raw)
                .map_err(|e| ConfigError::invalid("stream.url", e.to_string()))?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(ConfigError::invalid(
                    "stream.url",
                    format!("scheme must be ws or wss, got '{}'", url.scheme()),
                ));
            }
        }

        if let Some(raw) = self.upstream.base() {
            let url = Url::parse(raw)
                .map_err(|e| ConfigError::invalid("upstream.base_url", e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::invalid(
                    "upstream.base_url",
                    format!("scheme must be http or https, got '{}'", url.scheme()),
                ));
            }
        }

        Ok(())
    }
}
