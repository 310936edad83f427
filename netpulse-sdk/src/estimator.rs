//! Throughput estimation from two counter samples.
//!
//! Everything here is pure: the previous sample and the held rate are owned
//! by the caller.

use netpulse_types::{CounterSample, Throughput, BYTES_PER_MEGABYTE};

use crate::error::{Error, Result};

/// Compute MB/s in each direction between two samples.
///
/// Byte deltas are clamped at zero, so a counter reset or wrap reads as no
/// traffic rather than a negative or enormous rate. Fails with
/// [`Error::ClockAnomaly`] when `current` is not strictly later than
/// `previous`.
pub fn try_estimate(previous: &CounterSample, current: &CounterSample) -> Result<Throughput> {
    let delta_ms = current.taken_at.millis_since(previous.taken_at);
    if delta_ms <= 0 {
        return Err(Error::ClockAnomaly { delta_ms });
    }
    let seconds = current.taken_at.seconds_since(previous.taken_at);

    let received = current.received_bytes.saturating_sub(previous.received_bytes);
    let sent = current.sent_bytes.saturating_sub(previous.sent_bytes);

    Ok(Throughput {
        download_mbps: received as f64 / seconds / BYTES_PER_MEGABYTE,
        upload_mbps: sent as f64 / seconds / BYTES_PER_MEGABYTE,
    })
}

/// Like [`try_estimate`], but holds `held` on a clock anomaly.
pub fn estimate(previous: &CounterSample, current: &CounterSample, held: Throughput) -> Throughput {
    try_estimate(previous, current).unwrap_or(held)
}
