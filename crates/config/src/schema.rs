use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum poll interval. Ticks below the store's 1 s coalescing interval
/// silently merge into one sample; 200 ms is the floor we accept at all.
pub const MIN_POLL_INTERVAL_MS: u64 = 200;

/// Minimum flush interval — flushing rewrites the whole history file.
pub const MIN_FLUSH_INTERVAL_SECS: u64 = 5;

/// Root configuration structure parsed from `netpulse.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// How often the poller samples the interface counters (milliseconds).
    pub poll_interval_ms: u64,
    /// How often the history is checkpointed to disk (seconds).
    pub flush_interval_secs: u64,
    /// Trailing hours of history to keep (the store clamps to 1–168).
    pub retention_hours: i64,
    /// Where the history CSV lives. `None` = XDG data dir default.
    pub history_path: Option<PathBuf>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            flush_interval_secs: 60,
            retention_hours: 24,
            history_path: None,
        }
    }
}

impl PulseConfig {
    /// Poll interval with the floor applied.
    #[must_use]
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS)
    }

    /// Flush interval with the floor applied.
    #[must_use]
    pub fn flush_interval_secs(&self) -> u64 {
        self.flush_interval_secs.max(MIN_FLUSH_INTERVAL_SECS)
    }

    /// The history file path, defaulting to
    /// `$XDG_DATA_HOME/netpulse/history.csv`.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_path {
            return path.clone();
        }
        let base = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".local").join("share")
            });
        base.join("netpulse").join("history.csv")
    }
}
