//! Error types for ring store operations

use thiserror::Error;

/// Ring store operation result type
pub type Result<T> = std::result::Result<T, RingError>;

/// Ring store operation errors
#[derive(Error, Debug)]
pub enum RingError {
    /// Device I/O failure, surfaced as-is and never retried
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No sector header matched the expected version during scan
    #[error("No sector header matches version {0:#010x}")]
    Unformatted(u32),

    /// On-media slot/sector state is internally inconsistent
    #[error("Inconsistent media: {0}")]
    Corrupt(&'static str),

    /// Fetch or discard found nothing between the read and write cursors
    #[error("No records available")]
    Empty,

    /// Caller buffer or payload does not match the configured object size
    #[error("Payload length {got} does not match object size {expected}")]
    PayloadSize { expected: u32, got: usize },

    /// Partition arithmetic does not yield a usable ring
    #[error("Unusable geometry: {0}")]
    Geometry(&'static str),
}
