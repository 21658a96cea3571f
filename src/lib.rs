//! Pulseboard - real-time data layer for a server monitoring dashboard
//!
//! Keeps one WebSocket connection to a probe backend alive, decodes each
//! snapshot frame, retains the latest snapshot plus a bounded history, and
//! fans both out to any number of in-process consumers.
//!
//! ```
//! use pulseboard::connection::FrameSink;
//! use pulseboard::store::MessageStore;
//!
//! let store = MessageStore::new();
//! store.on_frame(r#"{"now":1000,"servers":[{"id":1,"last_active":"1970-01-01T00:00:00.970Z"}]}"#);
//!
//! let latest = store.latest().unwrap();
//! assert!(latest.views()[0].online);
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod connection;
pub mod distribution;
pub mod logging;
pub mod metrics;
pub mod proxy;
pub mod store;
pub mod telemetry;
