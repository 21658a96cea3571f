//! Telemetry snapshot decoding and derived views.
//!
//! The probe backend pushes one JSON frame per tick:
//!
//! ```json
//! { "now": 1700000000000, "online": 3, "servers": [ { "id": 1, "name": "edge-1", ... } ] }
//! ```
//!
//! [`decode_frame`] turns a frame into an immutable [`Snapshot`]. Everything
//! a dashboard renders (presence, utilization percentages, MiB/s speeds) is
//! derived on read from the snapshot and its embedded reference clock, never
//! from the local clock.
//!
//! # Example
//!
//! ```
//! use pulseboard::telemetry::decode_frame;
//!
//! let raw = r#"{"now":1000,"servers":[{"id":1,"name":"a","last_active":"1970-01-01T00:00:00.970Z"}]}"#;
//! let snapshot = decode_frame(raw).unwrap();
//! let views = snapshot.views();
//! assert!(views[0].online);
//! ```

mod decode;
mod error;
mod types;
mod view;

pub use decode::decode_frame;
pub use error::DecodeError;
pub use types::*;
pub use view::*;
