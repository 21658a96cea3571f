//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::PulseboardConfig;
use crate::connection::{ConnectionManager, WsDialer};
use crate::logging::init_tracing;
use crate::store::MessageStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<PulseboardConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        PulseboardConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        PulseboardConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(ref upstream) = args.upstream {
        config.upstream.base_url = Some(upstream.clone());
    }

    Ok(config)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;
    let stream_url = config.stream_url()?;

    init_tracing(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Pulseboard");
    tracing::debug!(?config, "Loaded configuration");

    let store = Arc::new(MessageStore::with_capacity(config.stream.history_capacity));

    let dialer = Arc::new(WsDialer::new(config.stream.connect_timeout()));
    let connection = ConnectionManager::spawn(
        config.stream.connection_config(stream_url.clone()),
        dialer,
        store.clone(),
    );
    tracing::info!(url = %stream_url, "Snapshot stream client started");

    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        Arc::clone(&store),
        connection.subscribe_status(),
    )?);
    let app = create_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Pulseboard listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    tracing::info!("Closing snapshot stream");
    connection.close().await;

    tracing::info!("Pulseboard stopped");
    Ok(())
}
