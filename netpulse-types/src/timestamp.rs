//! Wall-clock timestamps for samples and published records.
//!
//! Milliseconds since the Unix epoch are the canonical unit so that a record
//! written by one process compares cleanly against the clock of another.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Create from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Get the value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Signed milliseconds elapsed from `earlier` to `self`.
    ///
    /// Negative when `earlier` is actually later, which happens when the wall
    /// clock is stepped backwards between two samples.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 as i128 - earlier.0 as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Signed seconds elapsed from `earlier` to `self`.
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        self.millis_since(earlier) as f64 / 1000.0
    }

    /// How old this timestamp is relative to `now`. Zero if it lies in the future.
    pub fn age(&self, now: Timestamp) -> Duration {
        Duration::from_millis(now.0.saturating_sub(self.0))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        time.duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_millis() as u64))
            .unwrap_or_default()
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> Self {
        UNIX_EPOCH + Duration::from_millis(ts.0)
    }
}
