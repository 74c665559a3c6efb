//! Summary statistics over a history snapshot — the numbers behind the
//! dashboard's peak/average/min cards, the busiest-hour label, and the
//! download:upload ratio.

use chrono::{DateTime, Duration, Utc};
use pulse_core::{Bucket, Sample, Stats};

/// Rate statistics over the samples inside `[now − window, now]`.
/// An empty window yields a zeroed [`Stats`] — never an error.
pub fn summarize(samples: &[Sample], window: Duration, now: DateTime<Utc>) -> Stats {
    let cutoff = now - window;
    let recent: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.timestamp >= cutoff && s.timestamp <= now)
        .collect();

    if recent.is_empty() {
        return Stats::default();
    }

    let downloads: Vec<f64> = recent.iter().map(|s| s.download_kbps).collect();
    let uploads: Vec<f64> = recent.iter().map(|s| s.upload_kbps).collect();

    Stats {
        peak_download: max(&downloads),
        peak_upload: max(&uploads),
        avg_download: mean(&downloads),
        avg_upload: mean(&uploads),
        min_download: min(&downloads),
        min_upload: min(&uploads),
        stddev_download: stddev(&downloads),
        stddev_upload: stddev(&uploads),
        sample_count: recent.len(),
    }
}

/// Index of the bucket with the most combined activity. Ties resolve to
/// the earliest index — a deterministic left-to-right scan.
pub fn busiest_bucket(buckets: &[Bucket]) -> usize {
    let mut busiest = 0;
    for (i, b) in buckets.iter().enumerate() {
        if b.total_delta() > buckets[busiest].total_delta() {
            busiest = i;
        }
    }
    busiest
}

/// Download:upload ratio across all buckets, or `None` when nothing was
/// uploaded — callers show "n/a" rather than infinity.
pub fn ratio(buckets: &[Bucket]) -> Option<f64> {
    let download: u64 = buckets.iter().map(|b| b.download_delta).sum();
    let upload: u64 = buckets.iter().map(|b| b.upload_delta).sum();
    if upload == 0 {
        return None;
    }
    Some(download as f64 / upload as f64)
}

/// Total bytes moved inside `[now − window, now]`: last minus first
/// cumulative counter, each clamped to ≥ 0 so a counter reset can't show
/// negative traffic. Fewer than two samples in the window is `(0, 0)`.
pub fn window_total(samples: &[Sample], window: Duration, now: DateTime<Utc>) -> (u64, u64) {
    let cutoff = now - window;
    let mut in_window = samples
        .iter()
        .filter(|s| s.timestamp >= cutoff && s.timestamp <= now);

    let (Some(first), Some(last)) = (in_window.next(), in_window.next_back()) else {
        return (0, 0);
    };

    (
        last.total_download_bytes.saturating_sub(first.total_download_bytes),
        last.total_upload_bytes.saturating_sub(first.total_upload_bytes),
    )
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MIN, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MAX, f64::min)
}

/// Population standard deviation: `sqrt(mean((x − mean)²))`.
fn stddev(values: &[f64]) -> f64 {
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
