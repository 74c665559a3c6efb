pub mod clock;
pub mod error;
pub mod sample;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PulseError, Result};
pub use sample::{Bucket, Sample, Stats};
