//! Frame decoding.

use super::error::DecodeError;
use super::types::{ServerEntry, Snapshot};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

#[derive(Deserialize)]
struct WireFrame {
    now: Option<i64>,
    /// Outer `None`: field absent. Inner `None`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    servers: Option<Option<Vec<ServerEntry>>>,
    #[serde(default)]
    online: Option<u64>,
}

/// Wrap whatever was present, `null` included, so it stays distinct from
/// an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Decode one raw frame into a [`Snapshot`].
///
/// `now` and `servers` are required. A `null` server list (what the backend
/// sends with no agents registered) decodes as empty. Duplicate ids reject
/// the whole frame.
pub fn decode_frame(raw: &str) -> Result<Snapshot, DecodeError> {
    let frame: WireFrame = serde_json::from_str(raw)?;

    let server_time = frame.now.ok_or(DecodeError::MissingField("now"))?;
    let servers = frame
        .servers
        .ok_or(DecodeError::MissingField("servers"))?
        .unwrap_or_default();

    let mut seen = HashSet::with_capacity(servers.len());
    for server in &servers {
        if !seen.insert(server.id) {
            return Err(DecodeError::DuplicateServer(server.id));
        }
    }

    Ok(Snapshot {
        server_time,
        servers,
        online_viewers: frame.online,
    })
}
