//! Hourly bucket aggregation over a history snapshot.
//!
//! Cumulative counters are sampled at irregular real intervals (system
//! load, suspend/resume), so a sample rarely lands exactly on an hour
//! boundary. Each bucket therefore reads the last known counter value at
//! or before each of its bounds and takes the difference, which stays
//! monotonic and non-negative without requiring dense sampling.

use chrono::{DateTime, Duration, Utc};
use pulse_core::{Bucket, Sample};

/// Buckets per request: one per trailing hour, oldest first.
pub const BUCKET_COUNT: usize = 24;

/// Derive the 24 trailing hourly buckets from a snapshot.
///
/// The grid is time-derived, independent of the data: 24 contiguous
/// one-hour windows ending at the top of the current hour, so bucket 0
/// starts at `floor_to_hour(now) − 23h`. An empty snapshot yields 24
/// zero-delta buckets on that same grid.
///
/// When no sample exists at or before a bucket bound, the earliest sample
/// stands in. That keeps the first bucket of a fresh dataset from reading
/// as a false zero, at the cost that it may cover less than a true hour
/// of collection.
pub fn hourly_buckets(samples: &[Sample], now: DateTime<Utc>) -> [Bucket; BUCKET_COUNT] {
    let oldest_start = floor_to_hour(now) - Duration::hours(BUCKET_COUNT as i64 - 1);

    std::array::from_fn(|i| {
        let start = oldest_start + Duration::hours(i as i64);
        let end = start + Duration::hours(1);

        let (download_delta, upload_delta) = match (
            at_or_before(samples, start).or_else(|| samples.first()),
            at_or_before(samples, end).or_else(|| samples.first()),
        ) {
            (Some(s0), Some(s1)) => (
                s1.total_download_bytes.saturating_sub(s0.total_download_bytes),
                s1.total_upload_bytes.saturating_sub(s0.total_upload_bytes),
            ),
            _ => (0, 0),
        };

        Bucket {
            start,
            download_delta,
            upload_delta,
        }
    })
}

/// Truncate to the top of the hour (UTC).
fn floor_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(t)
}

/// Last sample with `timestamp <= bound`. Binary search — the snapshot is
/// sorted ascending by the store invariant.
fn at_or_before(samples: &[Sample], bound: DateTime<Utc>) -> Option<&Sample> {
    let idx = samples.partition_point(|s| s.timestamp <= bound);
    idx.checked_sub(1).map(|i| &samples[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn dl_sample(ts: DateTime<Utc>, dl: u64) -> Sample {
        Sample::new(ts, dl, 0, 0.0, 0.0)
    }

    #[test]
    fn always_24_contiguous_hour_buckets_ending_now() {
        // awkward `now` — mid-hour, odd minutes
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 17, 42, 13).unwrap();
        let buckets = hourly_buckets(&[], now);

        assert_eq!(buckets.len(), BUCKET_COUNT);
        let newest_start = Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap();
        assert_eq!(buckets[23].start, newest_start);
        assert_eq!(buckets[0].start, newest_start - Duration::hours(23));
        for w in buckets.windows(2) {
            assert_eq!(w[1].start - w[0].start, Duration::hours(1));
        }
    }

    #[test]
    fn empty_snapshot_yields_zero_deltas_on_the_grid() {
        let buckets = hourly_buckets(&[], t0());
        assert!(buckets.iter().all(|b| b.download_delta == 0 && b.upload_delta == 0));
    }

    #[test]
    fn hourly_deltas_from_cumulative_counters() {
        // samples at T+0, T+1h, T+2h with now = T+2h
        let samples = vec![
            dl_sample(t0(), 0),
            dl_sample(t0() + Duration::seconds(3600), 1_000_000),
            dl_sample(t0() + Duration::seconds(7200), 3_000_000),
        ];
        let now = t0() + Duration::seconds(7200);
        let buckets = hourly_buckets(&samples, now);

        // the newest bucket starts at floor(now) = T+2h, so the bucket
        // spanning [T, T+1h) sits at index 21
        assert_eq!(buckets[21].start, t0());
        assert_eq!(buckets[21].download_delta, 1_000_000);
        // bucket spanning [T+1h, T+2h)
        assert_eq!(buckets[22].start, t0() + Duration::hours(1));
        assert_eq!(buckets[22].download_delta, 2_000_000);
        // the still-open hour has seen no counter movement yet
        assert_eq!(buckets[23].start, t0() + Duration::hours(2));
        assert_eq!(buckets[23].download_delta, 0);
    }

    #[test]
    fn counter_regression_clamps_to_zero() {
        // a reboot between the two samples resets the counter
        let samples = vec![
            dl_sample(t0(), 5_000_000),
            dl_sample(t0() + Duration::hours(1), 200),
        ];
        let buckets = hourly_buckets(&samples, t0() + Duration::hours(1));

        assert!(buckets.iter().all(|b| b.download_delta == 0 || b.download_delta == 200));
        assert_eq!(buckets[23].download_delta, 0);
    }

    #[test]
    fn first_sample_stands_in_for_missing_bounds() {
        // collection started 30 min into the newest bucket's hour
        let start_of_data = t0() + Duration::hours(23) + Duration::minutes(30);
        let samples = vec![
            dl_sample(start_of_data, 1_000),
            dl_sample(start_of_data + Duration::minutes(20), 9_000),
        ];
        let now = t0() + Duration::hours(23) + Duration::minutes(55);
        let buckets = hourly_buckets(&samples, now);

        // older buckets: both bounds fall back to the first sample → zero
        assert_eq!(buckets[0].download_delta, 0);
        // the live bucket measures from the first available sample
        assert_eq!(buckets[23].download_delta, 8_000);
    }
}
