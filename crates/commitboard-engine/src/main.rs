//! Indexer binary for Commitboard.
//!
//! Wires together the chain provider, the event collector, the poller, and
//! the observer API. It loads configuration, starts the HTTP server,
//! and keeps the published view fresh until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `commitboard-config.yaml`
//! 3. Build the calendar clock
//! 4. Connect the HTTP provider and check the chain id
//! 5. Build observer state (puzzles, contract, status TTL)
//! 6. Start the observer API server
//! 7. Run the poller until shutdown

mod error;
mod observer_sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use commitboard_chain::{ChainProvider, CommitContract, EventCollector};
use commitboard_core::clock::CalendarClock;
use commitboard_core::config::CommitboardConfig;
use commitboard_core::poller::Poller;
use commitboard_core::puzzle::PuzzleBook;
use commitboard_observer::{AppState, ServerConfig};
use tokio::sync::{Notify, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_sink::ObserverSink;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "commitboard-config.yaml";

/// Application entry point for the indexer.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the node URL does not
/// parse, or the observer cannot bind its port.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("commitboard-engine starting");

    run().await?;

    info!("commitboard-engine shutdown complete");
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 2. Load configuration.
    let config = load_config(&config_path())?;
    info!(
        rpc_url = %config.chain.rpc_url,
        contract = %config.chain.contract_address,
        chain_id = config.chain.chain_id,
        poll_interval_ms = config.polling.interval_ms,
        puzzles = config.puzzles.len(),
        "Configuration loaded"
    );

    // 3. Calendar clock.
    let clock = CalendarClock::new(&config.calendar)?;
    info!(utc_offset = %clock.offset(), today = %clock.today(), "Calendar clock ready");

    // 4. Chain provider.
    let provider = commitboard_chain::connect(&config.chain)?;
    check_chain_id(&provider, &config.chain.rpc_url, config.chain.chain_id).await;
    let collector = Arc::new(EventCollector::new(provider.clone(), &config.chain));
    let contract = Arc::new(CommitContract::new(provider, &config.chain));

    // 5. Observer state.
    let trigger = Arc::new(Notify::new());
    let app_state = Arc::new(
        AppState::new(clock)
            .with_puzzles(PuzzleBook::new(config.puzzles.clone()))
            .with_contract(contract)
            .with_status_ttl(config.observer.status_ttl())
            .with_refresh_trigger(Arc::clone(&trigger)),
    );

    // 6. Observer API server.
    let server_config = ServerConfig::from(&config.observer);
    let observer_handle =
        commitboard_observer::spawn_observer(&server_config, Arc::clone(&app_state)).await?;
    info!(port = server_config.port, "Observer API server started");

    // 7. Poller.
    let poller = Arc::new(
        Poller::new(
            collector,
            Arc::new(ObserverSink::new(Arc::clone(&app_state))),
            clock,
            config.polling.interval(),
            config.polling.leaderboard_limit,
        )
        .with_trigger(trigger),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(Arc::clone(&poller).run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        warn!(error = %e, "Poller task ended abnormally");
    }
    observer_handle.abort();

    Ok(())
}

/// Config path from `COMMITBOARD_CONFIG`, else the default file name.
fn config_path() -> PathBuf {
    std::env::var_os("COMMITBOARD_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<CommitboardConfig, EngineError> {
    if path.exists() {
        Ok(CommitboardConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(CommitboardConfig::parse("")?)
    }
}

/// Warn if the node serves a different chain than configured.
///
/// A mismatch is not fatal: the node may simply be unreachable at startup
/// and the poller will keep retrying.
async fn check_chain_id(provider: &ChainProvider, url: &str, expected: u64) {
    match commitboard_chain::provider::chain_id(provider).await {
        Ok(actual) if actual == expected => info!(chain_id = actual, "Connected to chain"),
        Ok(actual) => warn!(expected, actual, url, "Chain id mismatch"),
        Err(e) => warn!(error = %e, url, "Chain id check failed"),
    }
}
