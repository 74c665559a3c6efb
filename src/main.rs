//! netpulse — backend daemon for a desktop network-throughput widget.
//!
//! Polls the interface counters, keeps a rolling sample history, and
//! checkpoints it to CSV for the charts and dashboards to read.
//!
//! Run with:  `RUST_LOG=info netpulse`

use anyhow::Result;
use pulse_config::ConfigWatcher;
use pulse_history::{csv, SampleStore};
use pulse_system::{spawn_flusher, spawn_poller};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("netpulse v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = pulse_config::default_path();
    let config = pulse_config::load(&config_path)?;
    let history_path = config.history_path();

    // Restore whatever the last run left behind; a missing or partially
    // corrupted file degrades to a shorter (or empty) history.
    let store = Arc::new(SampleStore::new());
    store.hydrate(csv::load(&history_path)?);
    store.set_retention(config.retention_hours);
    tracing::info!(
        samples = store.len(),
        path = %history_path.display(),
        "history restored"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = spawn_poller(
        Arc::clone(&store),
        config.poll_interval_ms(),
        shutdown_rx.clone(),
    );
    let flusher = spawn_flusher(
        Arc::clone(&store),
        history_path.clone(),
        config.flush_interval_secs(),
        shutdown_rx,
    );

    // Live config reload: only retention can change on a running store;
    // timer changes take effect on the next launch.
    let (_watcher, mut config_changed) = ConfigWatcher::spawn(&config_path);
    let reload_store = Arc::clone(&store);
    let reload_path = config_path.clone();
    tokio::spawn(async move {
        while config_changed.recv().await.is_some() {
            match pulse_config::load(&reload_path) {
                Ok(new_config) => {
                    tracing::info!(
                        retention_hours = new_config.retention_hours,
                        "config reloaded"
                    );
                    reload_store.set_retention(new_config.retention_hours);
                }
                Err(e) => tracing::warn!("config reload failed: {e}"),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    let _ = shutdown_tx.send(true);
    let _ = poller.await;
    let _ = flusher.await;

    // Final checkpoint so nothing observed since the last flush is lost.
    csv::save(&history_path, &store.snapshot())?;
    tracing::info!("history saved; bye");

    Ok(())
}
