//! Concierge application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Open (and optionally seed) the SQLite database
//! 3. Build the interpreter and start its cache sweeper
//! 4. Serve HTTP + WebSocket until Ctrl-C

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use concierge_api::{routes, AppState};
use concierge_core::config::ConciergeConfig;
use concierge_nlu::ProcessMemoryProbe;
use concierge_storage::{seed_demo_data, Database};

use crate::cli::CliArgs;

/// Expand ~ to the home directory.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    match data_dir.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(data_dir),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = if config_file.exists() {
        Some(ConciergeConfig::load(&config_file))
    } else {
        None
    };
    let mut config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => ConciergeConfig::default(),
    };

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Concierge v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Some(Ok(_)) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(Err(e)) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config, using defaults")
        }
        None => tracing::info!(path = %config_file.display(), "No config file, using defaults"),
    }

    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    config.general.port = args.resolve_port(config.general.port);

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let db_path = data_dir.join("concierge.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    if args.seed && seed_demo_data(Arc::clone(&db))? {
        tracing::info!("Demo data loaded");
    }

    // Interpreter.
    let probe = Arc::new(ProcessMemoryProbe::new(config.memory.budget_bytes()));
    let state = AppState::from_database(config.clone(), db, probe);

    let cancel = CancellationToken::new();
    let sweeper = state.interpreter.spawn_sweeper(
        Duration::from_secs(config.interpreter.sweep_interval_secs.max(1)),
        cancel.clone(),
    );

    // === API server ===

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
    };

    let served = routes::start_server(&config, state, shutdown).await;
    cancel.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Cache sweeper ended abnormally");
    }
    if let Err(e) = served {
        tracing::error!(error = %e, "Server stopped with an error");
        tracing::error!("Try: CONCIERGE_PORT={} concierge", config.general.port.saturating_add(1));
        return Err(e.into());
    }

    tracing::info!("Concierge stopped");
    Ok(())
}
