use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of the network counters at a point in time.
///
/// Cumulative totals come straight from the interface counters; the
/// instantaneous rates are computed by the poller from the delta to the
/// previous tick. Samples are immutable once constructed — every reader
/// works on an owned snapshot copied out of the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation time (always UTC).
    pub timestamp: DateTime<Utc>,
    /// Cumulative bytes received across all interfaces.
    pub total_download_bytes: u64,
    /// Cumulative bytes transmitted across all interfaces.
    pub total_upload_bytes: u64,
    /// Instantaneous download rate in KB/s.
    pub download_kbps: f64,
    /// Instantaneous upload rate in KB/s.
    pub upload_kbps: f64,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Utc>,
        total_download_bytes: u64,
        total_upload_bytes: u64,
        download_kbps: f64,
        upload_kbps: f64,
    ) -> Self {
        Self {
            timestamp,
            total_download_bytes,
            total_upload_bytes,
            download_kbps,
            upload_kbps,
        }
    }
}

/// One derived hour of byte-delta activity.
///
/// Buckets are ephemeral: recomputed from the sample history on every
/// request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Start of the hour this bucket covers (UTC, on the hour).
    pub start: DateTime<Utc>,
    /// Bytes downloaded during the hour (clamped to ≥ 0 on counter resets).
    pub download_delta: u64,
    /// Bytes uploaded during the hour (clamped to ≥ 0 on counter resets).
    pub upload_delta: u64,
}

impl Bucket {
    /// Combined download + upload activity, used to rank buckets.
    #[must_use]
    pub fn total_delta(&self) -> u64 {
        self.download_delta.saturating_add(self.upload_delta)
    }
}

/// Summary statistics over a window of samples. All rates in KB/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub peak_download: f64,
    pub peak_upload: f64,
    pub avg_download: f64,
    pub avg_upload: f64,
    pub min_download: f64,
    pub min_upload: f64,
    /// Population standard deviation of the download rate.
    pub stddev_download: f64,
    /// Population standard deviation of the upload rate.
    pub stddev_upload: f64,
    /// Number of samples the statistics were computed from.
    pub sample_count: usize,
}
