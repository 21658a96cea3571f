//! Response bodies and errors of the dashboard API.

use crate::telemetry::{Overview, SeriesPoint, ServerView, Snapshot};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// Error envelope: `{"error": {"message": ..., "type": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
}

impl ApiError {
    /// 503 before the first snapshot has arrived.
    pub fn no_snapshot() -> Self {
        Self {
            error: ApiErrorBody {
                message: "No snapshot received from the stream yet".to_string(),
                r#type: "service_unavailable".to_string(),
            },
        }
    }

    /// 404 for an unknown server id.
    pub fn server_not_found(id: u64) -> Self {
        Self {
            error: ApiErrorBody {
                message: format!("Server {} not found in the latest snapshot", id),
                r#type: "not_found".to_string(),
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.error.r#type.as_str() {
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// One snapshot rendered for the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub server_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_viewers: Option<u64>,
    pub servers: Vec<ServerView>,
}

impl From<&Snapshot> for SnapshotResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            server_time: snapshot.server_time,
            online_viewers: snapshot.online_viewers,
            servers: snapshot.views(),
        }
    }
}

/// `GET /api/history` without a server filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub capacity: usize,
    pub snapshots: Vec<SnapshotResponse>,
}

/// `GET /api/history?server_id=N`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub server_id: u64,
    pub points: Vec<SeriesPoint>,
}

/// Message pushed to browsers over `/ws` for each new snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub overview: Overview,
    #[serde(flatten)]
    pub snapshot: SnapshotResponse,
}

impl From<&Snapshot> for LiveUpdate {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            overview: snapshot.overview(),
            snapshot: SnapshotResponse::from(snapshot),
        }
    }
}
