use pulse_core::{Clock, Sample};
use pulse_history::SampleStore;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::Networks;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::info;

/// Floor on the tick interval. Anything under the store's 1 s coalescing
/// interval merges into one sample per second anyway.
const MIN_TICK_MS: u64 = 200;

/// Spawn a background Tokio task that samples the interface counters every
/// `interval_ms` milliseconds (floored at 200 ms) and appends a [`Sample`]
/// to the store.
///
/// Cumulative totals are summed across all interfaces; the instantaneous
/// rate is the byte delta to the previous tick divided by the interval, in
/// KB/s. The first tick reports a zero rate — there is no previous tick to
/// diff against. A counter regression (interface reset) shows up as a zero
/// rate here; the stored totals are handled downstream by the clamped
/// delta aggregation.
///
/// The task stops when `shutdown` is signalled.
pub fn spawn_poller<C: Clock + 'static>(
    store: Arc<SampleStore<C>>,
    interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval_ms = interval_ms.max(MIN_TICK_MS);
    let interval_secs = interval_ms as f64 / 1000.0;

    tokio::spawn(async move {
        let mut networks = Networks::new_with_refreshed_list();
        let mut ticker = time::interval(Duration::from_millis(interval_ms));
        let mut previous: Option<(u64, u64)> = None;

        info!(interval_ms, "network poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            networks.refresh(false); // false = keep existing interfaces list

            let total_download: u64 = networks.iter().map(|(_, d)| d.total_received()).sum();
            let total_upload: u64 = networks.iter().map(|(_, d)| d.total_transmitted()).sum();

            let (download_kbps, upload_kbps) = match previous {
                Some((prev_dl, prev_ul)) => (
                    rate_kbps(total_download.saturating_sub(prev_dl), interval_secs),
                    rate_kbps(total_upload.saturating_sub(prev_ul), interval_secs),
                ),
                None => (0.0, 0.0),
            };
            previous = Some((total_download, total_upload));

            store.append(Sample::new(
                store.now(),
                total_download,
                total_upload,
                download_kbps,
                upload_kbps,
            ));
        }

        info!("network poller stopped");
    })
}

/// Bytes over an interval as KB/s.
fn rate_kbps(delta_bytes: u64, interval_secs: f64) -> f64 {
    delta_bytes as f64 / interval_secs / 1024.0
}
