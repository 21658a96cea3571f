//! Snapshot, overview and history handlers.

use super::types::{ApiError, HistoryResponse, SeriesResponse, SnapshotResponse};
use crate::api::AppState;
use crate::telemetry::{Overview, ServerView};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub server_id: Option<u64>,
}

/// GET /api/snapshot
pub async fn snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let latest = state.store.latest().ok_or_else(ApiError::no_snapshot)?;
    Ok(Json(SnapshotResponse::from(latest.as_ref())))
}

/// GET /api/overview
pub async fn overview(State(state): State<Arc<AppState>>) -> Result<Json<Overview>, ApiError> {
    let latest = state.store.latest().ok_or_else(ApiError::no_snapshot)?;
    Ok(Json(latest.overview()))
}

/// GET /api/servers/:id
pub async fn server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ServerView>, ApiError> {
    let latest = state.store.latest().ok_or_else(ApiError::no_snapshot)?;
    let entry = latest
        .server(id)
        .ok_or_else(|| ApiError::server_not_found(id))?;
    Ok(Json(entry.view(latest.server_time)))
}

/// GET /api/history[?server_id=N]
///
/// An empty history is a valid answer, not an error.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match query.server_id {
        Some(server_id) => Json(SeriesResponse {
            server_id,
            points: state.store.series(server_id),
        })
        .into_response(),
        None => Json(HistoryResponse {
            capacity: state.store.capacity(),
            snapshots: state
                .store
                .history()
                .iter()
                .map(|s| SnapshotResponse::from(s.as_ref()))
                .collect(),
        })
        .into_response(),
    }
}
