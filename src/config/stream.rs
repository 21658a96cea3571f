//! Snapshot stream configuration

use super::upstream::UpstreamConfig;
use crate::connection::{BackoffPolicy, ConnectionConfig};
use crate::store::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnect delay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    #[default]
    Exponential,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub policy: BackoffKind,
    pub base_ms: u64,
    pub cap_ms: u64,
    pub fixed_ms: u64,
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            policy: BackoffKind::Exponential,
            base_ms: 1000,
            cap_ms: 30_000,
            fixed_ms: 3000,
            max_attempts: crate::connection::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffConfig {
    pub fn to_policy(&self) -> BackoffPolicy {
        match self.policy {
            BackoffKind::Exponential => BackoffPolicy::exponential(
                Duration::from_millis(self.base_ms),
                Duration::from_millis(self.cap_ms),
            ),
            BackoffKind::Fixed => BackoffPolicy::fixed(Duration::from_millis(self.fixed_ms)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Explicit stream URL; overrides the one derived from the upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Stream path appended to the upstream base URL
    pub path: String,
    pub history_capacity: usize,
    pub connect_timeout_seconds: u64,
    pub backoff: BackoffConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: "/api/v1/ws/server".to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            connect_timeout_seconds: 10,
            backoff: BackoffConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Stream endpoint: the explicit `url`, else the upstream base URL with a
    /// WebSocket scheme and `path` appended.
    pub fn resolve_url(&self, upstream: &UpstreamConfig) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        let base = upstream.websocket_base()?;
        let base = base.as_str().trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        Some(format!("{}/{}", base, path))
    }

    pub fn connection_config(&self, url: String) -> ConnectionConfig {
        ConnectionConfig::new(url)
            .with_policy(self.backoff.to_policy())
            .with_max_attempts(self.backoff.max_attempts)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(base: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: Some(base.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_stream_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.history_capacity, 30);
        assert_eq!(config.backoff.max_attempts, 10);
        assert_eq!(config.backoff.to_policy(), BackoffPolicy::default());
    }

    #[test]
    fn test_resolve_url_prefers_explicit() {
        let config = StreamConfig {
            url: Some("wss://stream.example.com/live".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_url(&upstream("https://probe.example.com")).as_deref(),
            Some("wss://stream.example.com/live")
        );
    }

    #[test]
    fn test_resolve_url_from_upstream() {
        let config = StreamConfig::default();
        assert_eq!(
            config.resolve_url(&upstream("https://probe.example.com/")).as_deref(),
            Some("wss://probe.example.com/api/v1/ws/server")
        );
        assert_eq!(
            config.resolve_url(&upstream("http://10.0.0.2:8008")).as_deref(),
            Some("ws://10.0.0.2:8008/api/v1/ws/server")
        );
        assert!(config.resolve_url(&UpstreamConfig::default()).is_none());
    }

    #[test]
    fn test_fixed_policy_from_toml() {
        let config: StreamConfig = toml::from_str(
            r#"
            [backoff]
            policy = "fixed"
            fixed_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(
            config.backoff.to_policy(),
            BackoffPolicy::fixed(Duration::from_millis(2500))
        );
    }
}
