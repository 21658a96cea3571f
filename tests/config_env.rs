//! `PULSEBOARD_*` environment overrides.
//!
//! Kept in its own test binary as a single test so no other test observes
//! the mutated process environment.

use pulseboard::config::{LogFormat, PulseboardConfig};

#[test]
fn test_env_overrides_apply_in_order() {
    std::env::set_var("PULSEBOARD_PORT", "9100");
    std::env::set_var("PULSEBOARD_HOST", "127.0.0.1");
    std::env::set_var("PULSEBOARD_LOG_LEVEL", "debug");
    std::env::set_var("PULSEBOARD_LOG_FORMAT", "json");
    std::env::set_var("PULSEBOARD_UPSTREAM_URL", "https://probe.example.com");

    let config = PulseboardConfig::default().with_env_overrides();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(
        config.stream_url().unwrap(),
        "wss://probe.example.com/api/v1/ws/server"
    );

    // An explicit stream URL beats the derived one.
    std::env::set_var("PULSEBOARD_STREAM_URL", "ws://10.0.0.2:8008/custom");
    let config = PulseboardConfig::default().with_env_overrides();
    assert_eq!(config.stream_url().unwrap(), "ws://10.0.0.2:8008/custom");

    // Unparsable values keep what was there.
    std::env::set_var("PULSEBOARD_PORT", "not-a-port");
    std::env::set_var("PULSEBOARD_LOG_FORMAT", "xml");
    let mut base = PulseboardConfig::default();
    base.server.port = 8200;
    let config = base.with_env_overrides();
    assert_eq!(config.server.port, 8200);
    assert_eq!(config.logging.format, LogFormat::Pretty);

    for var in [
        "PULSEBOARD_PORT",
        "PULSEBOARD_HOST",
        "PULSEBOARD_LOG_LEVEL",
        "PULSEBOARD_LOG_FORMAT",
        "PULSEBOARD_UPSTREAM_URL",
        "PULSEBOARD_STREAM_URL",
    ] {
        std::env::remove_var(var);
    }
    let config = PulseboardConfig::default().with_env_overrides();
    assert!(config.stream_url().is_err());
}
