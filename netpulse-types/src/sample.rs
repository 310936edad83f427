//! CounterSample - cumulative interface counters at one instant.

use crate::Timestamp;

/// Cumulative byte counters summed over the active, non-loopback interfaces.
///
/// Samples are produced fresh on every sampling tick and never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterSample {
    /// Total bytes received since the counters were last reset.
    pub received_bytes: u64,

    /// Total bytes sent since the counters were last reset.
    pub sent_bytes: u64,

    /// When the counters were read.
    pub taken_at: Timestamp,

    /// Number of interfaces that contributed to the sums.
    pub active_interfaces: u32,
}

impl CounterSample {
    /// Create a sample with no interface count attached.
    pub fn new(received_bytes: u64, sent_bytes: u64, taken_at: Timestamp) -> Self {
        Self {
            received_bytes,
            sent_bytes,
            taken_at,
            active_interfaces: 0,
        }
    }

    /// The degraded sample used when the interfaces could not be enumerated.
    pub fn zero(taken_at: Timestamp) -> Self {
        Self::new(0, 0, taken_at)
    }

    /// Attach the number of contributing interfaces.
    pub fn with_active_interfaces(mut self, count: u32) -> Self {
        self.active_interfaces = count;
        self
    }
}
