//! Probe backend location

use serde::{Deserialize, Serialize};
use url::Url;

/// Where the probe backend lives. Used by the reverse proxy and, when no
/// explicit stream URL is given, to derive the stream endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// e.g. `https://probe.example.com`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout for proxied HTTP calls
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: 30,
        }
    }
}

impl UpstreamConfig {
    /// Base URL with any trailing slash removed.
    pub fn base(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }

    /// Base URL with the scheme switched to its WebSocket counterpart.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`. Returns `None` if the
    /// base URL is unset, unparsable, or uses another scheme.
    pub fn websocket_base(&self) -> Option<Url> {
        let mut url = Url::parse(self.base()?).ok()?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            "ws" | "wss" => return Some(url),
            _ => return None,
        };
        url.set_scheme(scheme).ok()?;
        Some(url)
    }
}
