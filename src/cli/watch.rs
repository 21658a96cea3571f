//! Watch command: follow the snapshot stream from a terminal

use crate::api::LiveUpdate;
use crate::cli::output::{format_overview, format_servers_table, format_update_json};
use crate::cli::WatchArgs;
use crate::config::{LoggingConfig, PulseboardConfig};
use crate::connection::{ConnectionManager, ConnectionState, WsDialer};
use crate::logging::init_tracing;
use crate::store::MessageStore;
use std::sync::Arc;

/// Config file if present, with the `--url` flag taking precedence.
pub fn load_watch_config(
    args: &WatchArgs,
) -> Result<PulseboardConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        PulseboardConfig::load(Some(&args.config))?
    } else {
        PulseboardConfig::default()
    };
    config = config.with_env_overrides();

    if let Some(ref url) = args.url {
        config.stream.url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Render one update the way the user asked for it.
pub fn render_update(update: &LiveUpdate, json: bool) -> Result<String, serde_json::Error> {
    if json {
        format_update_json(update)
    } else {
        Ok(format!(
            "{}\n{}",
            format_overview(&update.overview),
            format_servers_table(&update.snapshot.servers)
        ))
    }
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_watch_config(&args)?;
    let url = config.stream_url()?;

    // Only problems are worth printing next to the table.
    init_tracing(&LoggingConfig {
        level: "warn".to_string(),
        ..config.logging.clone()
    })?;

    let store = Arc::new(MessageStore::with_capacity(config.stream.history_capacity));
    let mut updates = store.hub().subscribe_latest();

    let handle = ConnectionManager::spawn(
        config.stream.connection_config(url),
        Arc::new(WsDialer::new(config.stream.connect_timeout())),
        store.clone(),
    );
    let mut status = handle.subscribe_status();

    let result = loop {
        tokio::select! {
            next = updates.next_snapshot() => {
                let Some(snapshot) = next else {
                    break Ok(());
                };
                println!("{}", render_update(&LiveUpdate::from(snapshot.as_ref()), args.json)?);
                if args.once {
                    break Ok(());
                }
            }
            changed = status.changed() => {
                let gave_up = status.borrow().state == ConnectionState::GaveUp;
                if gave_up || changed.is_err() {
                    break Err("stream unreachable: reconnect attempts exhausted".into());
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    handle.close().await;
    result
}
