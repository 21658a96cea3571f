//! Error types for frame decoding.

use thiserror::Error;

/// A frame that violates the backend contract. The frame is dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or a field has the wrong type
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// A top-level field the frame must carry is absent
    #[error("frame is missing required field '{0}'")]
    MissingField(&'static str),

    /// Two entries in one frame share an id
    #[error("duplicate server id {0} in frame")]
    DuplicateServer(u64),
}
