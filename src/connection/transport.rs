//! Socket abstraction used by the connection manager.

use super::error::ConnectionError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Opens a transport to a stream URL.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>, ConnectionError>;
}

/// A live, text-framed duplex connection.
#[async_trait]
pub trait Transport: Send {
    /// Next inbound text frame. `None` means the remote side closed.
    async fn recv(&mut self) -> Option<Result<String, ConnectionError>>;

    async fn send(&mut self, payload: String) -> Result<(), ConnectionError>;

    async fn close(&mut self);
}

/// WebSocket dialer backed by tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsDialer {
    connect_timeout: Duration,
}

impl WsDialer {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsDialer {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        let connect = connect_async(url);
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok((stream, response))) => {
                tracing::debug!(url, status = %response.status(), "WebSocket handshake complete");
                Ok(Box::new(WsTransport { stream }))
            }
            Ok(Err(e)) => Err(ConnectionError::Dial {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(ConnectionError::Timeout {
                url: url.to_string(),
                seconds: self.connect_timeout.as_secs(),
            }),
        }
    }
}

fn transport_error(e: WsError) -> ConnectionError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => ConnectionError::Closed,
        other => ConnectionError::Transport(other.to_string()),
    }
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Option<Result<String, ConnectionError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("Ignoring non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Remote closed stream");
                    return None;
                }
                // Ping/pong are answered by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Some(Err(transport_error(e))),
            }
        }
    }

    async fn send(&mut self, payload: String) -> Result<(), ConnectionError> {
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(transport_error)
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "Error while closing stream");
        }
    }
}
