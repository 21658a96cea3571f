//! WebSocket push of live snapshots to dashboard browsers.

use super::types::LiveUpdate;
use crate::api::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One subscription per socket, released when either direction ends.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.store.hub().subscribe_latest();

    let mut send_task = tokio::spawn(async move {
        // A browser that connects mid-stream gets the current snapshot first.
        let mut pending = subscription.current();
        loop {
            if let Some(snapshot) = pending.take() {
                let json = match serde_json::to_string(&LiveUpdate::from(snapshot.as_ref())) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize live update");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            match subscription.next_snapshot().await {
                Some(snapshot) => pending = Some(snapshot),
                None => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!("Dashboard WebSocket closed");
}
