//! Error types for sampling and publication.

use thiserror::Error;

/// Errors raised inside the sampling pipeline.
///
/// None of these are fatal: every caller in this crate recovers by falling
/// back to a zero sample, the previous rate, or a direct measurement.
#[derive(Debug, Error)]
pub enum Error {
    /// Enumerating the network interfaces failed.
    #[error("Interface query failed: {0}")]
    OsQuery(String),

    /// Writing to the shared store failed.
    #[error("Shared store write failed: {0}")]
    StoreWrite(String),

    /// Reading from the shared store failed.
    #[error("Shared store read failed: {0}")]
    StoreRead(String),

    /// A stored record could not be decoded.
    #[error("Malformed record: {0}")]
    Decode(String),

    /// Two samples were not in strictly increasing time order.
    #[error("Non-positive time delta between samples ({delta_ms} ms)")]
    ClockAnomaly {
        /// Milliseconds from the previous sample to the current one.
        delta_ms: i64,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
