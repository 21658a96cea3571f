//! Connection error types.

use thiserror::Error;

/// Transient stream failures. The manager never returns these to callers;
/// they drive the retry cycle and show up in logs and status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("failed to connect to {url}: {message}")]
    Dial { url: String, message: String },

    #[error("connecting to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    Closed,
}
