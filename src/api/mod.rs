//! # Dashboard API
//!
//! HTTP surface of the dashboard server.
//!
//! ## Endpoints
//!
//! - `GET /health` - Stream connection state and store counters
//! - `GET /api/snapshot` - Derived views of the latest snapshot (503 before the first frame)
//! - `GET /api/overview` - Fleet aggregate of the latest snapshot
//! - `GET /api/servers/:id` - One server of the latest snapshot
//! - `GET /api/history` - Retained history, or `?server_id=N` for one server's series
//! - `GET /ws` - Live snapshot push
//! - `GET /metrics` - Prometheus text format
//!
//! Anything else falls through to the reverse [`proxy`](crate::proxy).
//!
//! ## Example
//!
//! ```no_run
//! use pulseboard::api::{create_router, AppState};
//! use pulseboard::config::PulseboardConfig;
//! use pulseboard::connection::ConnectionStatus;
//! use pulseboard::store::MessageStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(PulseboardConfig::default());
//! let store = Arc::new(MessageStore::new());
//! let (_status_tx, status_rx) = tokio::sync::watch::channel(ConnectionStatus::default());
//!
//! let state = Arc::new(AppState::new(config, store, status_rx)?);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8008").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod health;
mod snapshot;
pub mod types;
mod websocket;

pub use types::*;

use crate::config::PulseboardConfig;
use crate::connection::ConnectionStatus;
use crate::metrics::MetricsCollector;
use crate::proxy::{self, cors::cors_middleware, MAX_BODY_SIZE};
use crate::store::MessageStore;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<PulseboardConfig>,
    pub store: Arc<MessageStore>,
    /// Live status of the stream connection
    pub connection_status: watch::Receiver<ConnectionStatus>,
    /// Client used by the reverse proxy
    pub http_client: reqwest::Client,
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(
        config: Arc<PulseboardConfig>,
        store: Arc<MessageStore>,
        connection_status: watch::Receiver<ConnectionStatus>,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_seconds))
            .pool_max_idle_per_host(10)
            .build()?;

        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&store),
            Instant::now(),
            crate::metrics::metrics_handle(),
        ));

        Ok(Self {
            config,
            store,
            connection_status,
            http_client,
            metrics_collector,
        })
    }
}

/// Create the router with all endpoints and the proxy fallback.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::handle))
        .route("/api/snapshot", get(snapshot::snapshot))
        .route("/api/overview", get(snapshot::overview))
        .route("/api/servers/:id", get(snapshot::server))
        .route("/api/history", get(snapshot::history))
        .route("/ws", get(websocket::websocket_handler))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .fallback(proxy::handle)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(cors_middleware))
        .with_state(state)
}
