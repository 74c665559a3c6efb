use thiserror::Error;

/// Top-level error type used across the entire application.
///
/// Deliberately small: nothing in the history engine is fatal (malformed
/// lines are skipped, out-of-range retention clamps), so only the config
/// layer and file I/O ever produce errors.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = PulseError> = std::result::Result<T, E>;
