//! Health check endpoint handler.

use crate::api::AppState;
use crate::connection::{ConnectionState, ConnectionStatus};
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub connection: ConnectionStatus,
    pub servers: ServerCounts,
    pub history: usize,
    pub subscribers: usize,
    pub frames_received: u64,
    pub decode_failures: u64,
}

/// Server counts in the latest snapshot.
#[derive(Debug, Default, Serialize)]
pub struct ServerCounts {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

/// GET /health
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connection = state.connection_status.borrow().clone();

    let servers = state
        .store
        .latest()
        .map(|snapshot| {
            let overview = snapshot.overview();
            ServerCounts {
                total: overview.total,
                online: overview.online,
                offline: overview.offline,
            }
        })
        .unwrap_or_default();

    let status = match connection.state {
        ConnectionState::Open => "healthy",
        ConnectionState::GaveUp => "unhealthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        connection,
        servers,
        history: state.store.len(),
        subscribers: state.store.hub().subscriber_count(),
        frames_received: state.store.frames_received(),
        decode_failures: state.store.decode_failures(),
    })
}
