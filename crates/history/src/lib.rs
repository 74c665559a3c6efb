//! The sample history engine: a rolling, deduplicated, retention-bounded
//! store of throughput samples, plus the CSV persistence and the derived
//! hourly-bucket / statistics views every chart and report reads from.
//!
//! Writers (the poller) call [`SampleStore::append`]; readers always go
//! through [`SampleStore::snapshot`] and compute on the copy, so aggregation
//! never blocks the polling tick.

pub mod buckets;
pub mod csv;
pub mod stats;
pub mod store;

pub use buckets::{hourly_buckets, BUCKET_COUNT};
pub use stats::{busiest_bucket, ratio, summarize, window_total};
pub use store::SampleStore;
