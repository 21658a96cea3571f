//! Bidirectional WebSocket bridge between a browser and the probe backend.

use super::error::ProxyError;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as UpstreamCloseFrame;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the upstream socket before the client upgrade is accepted, so a
/// dial failure can still be answered with a 500.
pub async fn dial_upstream(url: &str) -> Result<UpstreamSocket, ProxyError> {
    let (socket, _) = connect_async(url)
        .await
        .map_err(|e| ProxyError::WebSocket(e.to_string()))?;
    Ok(socket)
}

/// Pump frames both ways until either side closes.
pub async fn bridge(client: WebSocket, upstream: UpstreamSocket, url: String) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let mut to_upstream = tokio::spawn(async move {
        while let Some(Ok(msg)) = client_rx.next().await {
            let closing = matches!(msg, Message::Close(_));
            if upstream_tx.send(into_upstream(msg)).await.is_err() || closing {
                break;
            }
        }
    });

    let mut to_client = tokio::spawn(async move {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let Some(msg) = into_client(msg) else {
                continue;
            };
            let closing = matches!(msg, Message::Close(_));
            if client_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut to_upstream => to_client.abort(),
        _ = &mut to_client => to_upstream.abort(),
    }
    tracing::debug!(url = %url, "WebSocket bridge closed");
}

fn into_upstream(msg: Message) -> UpstreamMessage {
    match msg {
        Message::Text(text) => UpstreamMessage::Text(text),
        Message::Binary(bytes) => UpstreamMessage::Binary(bytes),
        Message::Ping(bytes) => UpstreamMessage::Ping(bytes),
        Message::Pong(bytes) => UpstreamMessage::Pong(bytes),
        Message::Close(frame) => UpstreamMessage::Close(frame.map(|f| UpstreamCloseFrame {
            code: f.code.into(),
            reason: f.reason,
        })),
    }
}

/// Raw frames have no browser-side counterpart and are dropped.
fn into_client(msg: UpstreamMessage) -> Option<Message> {
    match msg {
        UpstreamMessage::Text(text) => Some(Message::Text(text)),
        UpstreamMessage::Binary(bytes) => Some(Message::Binary(bytes)),
        UpstreamMessage::Ping(bytes) => Some(Message::Ping(bytes)),
        UpstreamMessage::Pong(bytes) => Some(Message::Pong(bytes)),
        UpstreamMessage::Close(frame) => Some(Message::Close(frame.map(|f| CloseFrame {
            code: f.code.into(),
            reason: f.reason,
        }))),
        UpstreamMessage::Frame(_) => None,
    }
}
