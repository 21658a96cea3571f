//! Proxy error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Any proxy failure. Rendered as a plain-text 500; nothing is retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream base URL is not configured")]
    UpstreamNotConfigured,

    #[error("invalid upstream URI: {0}")]
    InvalidUri(String),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("upstream request failed: {0}")]
    Forward(#[from] reqwest::Error),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("upstream websocket failed: {0}")]
    WebSocket(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Proxy request failed");
        metrics::counter!("pulseboard_proxy_requests_total", "status" => "500").increment(1);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_renders_500_with_message() {
        let response = ProxyError::UpstreamNotConfigured.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProxyError::InvalidUri("ws://".to_string()).to_string(),
            "invalid upstream URI: ws://"
        );
    }
}
