use pulse_core::Clock;
use pulse_history::{csv, SampleStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, warn};

/// Spawn a background Tokio task that checkpoints the history to `path`
/// every `interval_secs` seconds.
///
/// Each flush works on a detached [`SampleStore::snapshot`] copy, so disk
/// I/O never runs under the store lock. A failed save is logged and the
/// next interval retries — the in-memory history is unaffected.
///
/// The task stops when `shutdown` is signalled; the final save at exit is
/// the caller's responsibility.
pub fn spawn_flusher<C: Clock + 'static>(
    store: Arc<SampleStore<C>>,
    path: PathBuf,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(Duration::from_secs(interval_secs));
        // the immediate first tick would just rewrite what was loaded
        ticker.tick().await;

        info!(interval_secs, path = %path.display(), "history flusher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let snapshot = store.snapshot();
            if let Err(e) = csv::save(&path, &snapshot) {
                warn!("history flush to '{}' failed: {e}", path.display());
            }
        }

        info!("history flusher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_core::{ManualClock, Sample};

    #[tokio::test(start_paused = true)]
    async fn flusher_checkpoints_on_the_interval() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let store = Arc::new(SampleStore::with_clock(ManualClock::new(t0)));
        store.append(Sample::new(t0, 4_096, 1_024, 4.0, 1.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_flusher(Arc::clone(&store), path.clone(), 60, shutdown_rx);

        // cross one flush interval (virtual time — the runtime is paused)
        time::sleep(Duration::from_secs(61)).await;

        let _ = shutdown_tx.send(true);
        handle.await.unwrap();

        let restored = csv::load(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].total_download_bytes, 4_096);
    }

    #[tokio::test(start_paused = true)]
    async fn flusher_stops_on_shutdown_signal() {
        let store = Arc::new(SampleStore::new());
        let dir = tempfile::tempdir().unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_flusher(store, dir.path().join("h.csv"), 60, shutdown_rx);

        let _ = shutdown_tx.send(true);
        handle.await.unwrap();
    }
}
