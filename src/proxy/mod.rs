//! Reverse proxy to the probe backend.
//!
//! Every request the dashboard API does not route itself lands here and is
//! forwarded to `upstream.base_url` with the same method, path, query string
//! and body. WebSocket upgrades are bridged to the upstream socket. CORS
//! headers are added by [`cors::cors_middleware`] on the outer router.

pub mod cors;
mod error;
mod websocket;

pub use error::ProxyError;

use crate::api::AppState;
use axum::body::Body;
use axum::extract::{Request, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Largest request body forwarded upstream (10 MB).
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Fallback handler: forward anything unrouted to the upstream backend.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
    request: Request,
) -> Response {
    let result = match ws {
        Some(ws) => {
            // The request body is not `Sync`; only the target crosses the await.
            let target = path_and_query(&request).to_string();
            drop(request);
            upgrade(&state, ws, &target).await
        }
        None => forward(&state, request).await,
    };
    result.unwrap_or_else(IntoResponse::into_response)
}

fn path_and_query(request: &Request) -> &str {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

fn forward_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = source.clone();
    for name in HOP_BY_HOP.iter().chain(std::iter::once(&header::CONTENT_LENGTH)) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers
}

async fn forward(state: &AppState, request: Request) -> Result<Response, ProxyError> {
    let base = state
        .config
        .upstream
        .base()
        .ok_or(ProxyError::UpstreamNotConfigured)?;
    let url = format!("{}{}", base, path_and_query(&request));
    let url =
        url::Url::parse(&url).map_err(|e| ProxyError::InvalidUri(format!("{}: {}", url, e)))?;

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| ProxyError::Body(e.to_string()))?;

    tracing::debug!(method = %parts.method, url = %url, bytes = body.len(), "Forwarding request");

    let upstream = state
        .http_client
        .request(parts.method, url)
        .headers(forward_headers(&parts.headers))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    metrics::counter!("pulseboard_proxy_requests_total", "status" => status.as_u16().to_string())
        .increment(1);

    let mut response = Response::builder().status(status);
    if let Some(headers) = response.headers_mut() {
        for (name, value) in upstream.headers() {
            if !HOP_BY_HOP.contains(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ProxyError::InvalidResponse(e.to_string()))
}

async fn upgrade(
    state: &AppState,
    ws: WebSocketUpgrade,
    path_and_query: &str,
) -> Result<Response, ProxyError> {
    let base = state
        .config
        .upstream
        .websocket_base()
        .ok_or(ProxyError::UpstreamNotConfigured)?;
    let url = format!(
        "{}{}",
        base.as_str().trim_end_matches('/'),
        path_and_query
    );

    let upstream = websocket::dial_upstream(&url).await?;
    tracing::debug!(url = %url, "Bridging WebSocket to upstream");
    metrics::counter!("pulseboard_proxy_requests_total", "status" => "101").increment(1);

    Ok(ws.on_upgrade(move |socket| websocket::bridge(socket, upstream, url)))
}
