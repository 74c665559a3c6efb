use chrono::{DateTime, Duration, Utc};
use pulse_core::{Clock, Sample, SystemClock};
use std::sync::Mutex;
use tracing::debug;

/// Two samples closer together than this replace rather than append,
/// so sub-second polling jitter can't inflate the history.
pub const COALESCE_SECONDS: i64 = 1;

/// Retention bounds in hours. Out-of-range requests clamp, never error.
pub const MIN_RETENTION_HOURS: i64 = 1;
pub const MAX_RETENTION_HOURS: i64 = 168;
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// The rolling sample history — the system of record for every chart,
/// report, and export.
///
/// Invariants, held under a single coarse lock:
/// - samples are sorted ascending by timestamp;
/// - no two adjacent samples are less than [`COALESCE_SECONDS`] apart;
/// - after any mutation, every sample is newer than `now − retention`.
///
/// One writer task appends per tick; any number of readers take
/// [`snapshot`](Self::snapshot) copies and compute outside the lock.
pub struct SampleStore<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
}

struct Inner {
    samples: Vec<Sample>,
    retention: Duration,
}

impl SampleStore<SystemClock> {
    /// An empty store on wall-clock time with the default 24 h retention.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SampleStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SampleStore<C> {
    /// An empty store driven by `clock` (tests inject a manual one).
    pub fn with_clock(clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner {
                samples: Vec::new(),
                retention: Duration::hours(DEFAULT_RETENTION_HOURS),
            }),
            clock,
        }
    }

    /// Append one observation.
    ///
    /// If the store's newest sample is less than [`COALESCE_SECONDS`] older
    /// than `sample`, the newest entry is replaced instead of a new one
    /// being pushed. Expired leading entries are trimmed afterwards.
    /// Purely in-memory; never fails. Counter regressions (a reboot or
    /// interface reset) are stored as-is — delta consumers clamp to zero.
    pub fn append(&self, sample: Sample) {
        let now = self.clock.now();
        let mut inner = self.lock();

        match inner.samples.last_mut() {
            Some(last) if sample.timestamp - last.timestamp < Duration::seconds(COALESCE_SECONDS) => {
                *last = sample;
            }
            _ => inner.samples.push(sample),
        }

        inner.trim(now);
    }

    /// Replace the whole history, e.g. with the result of a startup load.
    /// The input is sorted, coalesced, and trimmed so the store invariants
    /// hold no matter what the file contained.
    pub fn hydrate(&self, mut samples: Vec<Sample>) {
        samples.sort_by_key(|s| s.timestamp);
        dedup_coalesce(&mut samples);

        let now = self.clock.now();
        let mut inner = self.lock();
        inner.samples = samples;
        inner.trim(now);
        debug!(samples = inner.samples.len(), "history hydrated");
    }

    /// An independent copy of the current history, oldest first.
    ///
    /// This is the only read path: aggregation and statistics run on the
    /// copy, so they never hold the lock against the writer tick.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().samples.clone()
    }

    /// Update the retention window and trim immediately.
    /// `hours` is clamped into `1..=168`.
    pub fn set_retention(&self, hours: i64) {
        let clamped = hours.clamp(MIN_RETENTION_HOURS, MAX_RETENTION_HOURS);
        if clamped != hours {
            debug!(requested = hours, clamped, "retention request out of range");
        }

        let now = self.clock.now();
        let mut inner = self.lock();
        inner.retention = Duration::hours(clamped);
        inner.trim(now);
    }

    /// The current retention window.
    pub fn retention(&self) -> Duration {
        self.lock().retention
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().samples.is_empty()
    }

    /// What the clock says right now; readers use this to line snapshots
    /// up with the same time source the store trims against.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a writer panicked mid-append; the
        // sample data itself is still a valid Vec.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    /// Drop leading entries older than `now − retention`. Leading-only,
    /// since the sequence is time-ordered.
    fn trim(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        let expired = self
            .samples
            .iter()
            .take_while(|s| s.timestamp < cutoff)
            .count();
        if expired > 0 {
            self.samples.drain(..expired);
        }
    }
}

/// Collapse entries closer than the coalescing interval, keeping the later
/// one. Expects `samples` sorted ascending; used when re-ingesting a file
/// that may have been hand-edited.
pub(crate) fn dedup_coalesce(samples: &mut Vec<Sample>) {
    let mut kept: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples.drain(..) {
        match kept.last_mut() {
            Some(last) if s.timestamp - last.timestamp < Duration::seconds(COALESCE_SECONDS) => {
                *last = s;
            }
            _ => kept.push(s),
        }
    }
    *samples = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pulse_core::ManualClock;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn sample(ts: DateTime<Utc>, dl: u64, ul: u64) -> Sample {
        Sample::new(ts, dl, ul, 0.0, 0.0)
    }

    #[test]
    fn appends_stay_sorted() {
        let clock = ManualClock::new(t0());
        let store = SampleStore::with_clock(clock);

        for i in 0..10 {
            store.append(sample(t0() + Duration::seconds(i * 5), i as u64, 0));
        }

        let snap = store.snapshot();
        assert_eq!(snap.len(), 10);
        assert!(snap.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn sub_second_arrivals_coalesce() {
        let store = SampleStore::with_clock(ManualClock::new(t0()));

        store.append(sample(t0(), 100, 0));
        store.append(sample(t0() + Duration::milliseconds(400), 150, 0));

        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        // the later arrival wins
        assert_eq!(snap[0].total_download_bytes, 150);
    }

    #[test]
    fn arrivals_a_second_apart_append() {
        let store = SampleStore::with_clock(ManualClock::new(t0()));

        store.append(sample(t0(), 100, 0));
        store.append(sample(t0() + Duration::seconds(1), 150, 0));

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn append_trims_expired_entries() {
        let clock = ManualClock::new(t0());
        let store = SampleStore::with_clock(clock);

        store.append(sample(t0(), 1, 1));
        store.append(sample(t0() + Duration::hours(1), 2, 2));

        // jump past the retention window for the first sample only
        store.clock.set(t0() + Duration::hours(24) + Duration::seconds(30));
        store.append(sample(t0() + Duration::hours(24) + Duration::seconds(30), 3, 3));

        let cutoff = store.now() - store.retention();
        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|s| s.timestamp >= cutoff));
    }

    #[test]
    fn set_retention_clamps_and_trims() {
        let clock = ManualClock::new(t0() + Duration::hours(10));
        let store = SampleStore::with_clock(clock);

        store.append(sample(t0(), 1, 1));
        store.append(sample(t0() + Duration::hours(9), 2, 2));

        store.set_retention(0); // clamps to 1 hour
        assert_eq!(store.retention(), Duration::hours(1));
        assert_eq!(store.len(), 1, "only the sample inside the last hour survives");

        store.set_retention(10_000); // clamps to 168 hours
        assert_eq!(store.retention(), Duration::hours(MAX_RETENTION_HOURS));
    }

    #[test]
    fn hydrate_sorts_dedups_and_trims() {
        let clock = ManualClock::new(t0() + Duration::hours(2));
        let store = SampleStore::with_clock(clock);

        let raw = vec![
            sample(t0() + Duration::hours(1), 30, 0),
            sample(t0() - Duration::hours(48), 1, 0), // expired
            sample(t0() + Duration::hours(1) + Duration::milliseconds(500), 31, 0), // coalesces
            sample(t0(), 10, 0),
        ];
        store.hydrate(raw);

        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].total_download_bytes, 10);
        assert_eq!(snap[1].total_download_bytes, 31);
    }

    #[test]
    fn concurrent_appends_and_snapshots_do_not_tear() {
        let store = Arc::new(SampleStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..1_000u64 {
                    store.append(Sample::new(
                        Utc::now() + Duration::seconds(i as i64 * 2),
                        i * 100,
                        i * 10,
                        1.0,
                        0.5,
                    ));
                }
            })
        };

        for _ in 0..100 {
            let snap = store.snapshot();
            // a torn read would show out-of-order timestamps
            assert!(snap.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }

        writer.join().unwrap();
    }
}
