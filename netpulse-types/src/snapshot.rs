//! ThroughputSnapshot - the complete record published on every tick.

use crate::{CounterSample, Timestamp, BYTES_PER_GIGABYTE};

/// Download and upload rates in MB/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Throughput {
    /// Receive rate in MB/s.
    pub download_mbps: f64,
    /// Send rate in MB/s.
    pub upload_mbps: f64,
}

impl Throughput {
    /// No traffic in either direction.
    pub const ZERO: Throughput = Throughput {
        download_mbps: 0.0,
        upload_mbps: 0.0,
    };

    /// Create a rate pair.
    pub const fn new(download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            download_mbps,
            upload_mbps,
        }
    }
}

/// A point-in-time view of network throughput, totals and connectivity.
///
/// There is exactly one live snapshot: each tick replaces the previous one as
/// a whole. The serialized field names are the shared entry layout and must
/// not change.
///
/// # Example
///
/// ```rust
/// use netpulse_types::{ThroughputSnapshot, Timestamp};
///
/// let snapshot = ThroughputSnapshot {
///     download_rate_mbps: 1.5,
///     upload_rate_mbps: 0.25,
///     total_received_gb: 12.0,
///     total_sent_gb: 3.0,
///     is_connected: true,
///     last_updated: Timestamp::from_secs(1_703_160_000),
/// };
///
/// assert_eq!(snapshot.rates().download_mbps, 1.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThroughputSnapshot {
    /// Download rate in MB/s.
    #[cfg_attr(feature = "serde", serde(rename = "downloadSpeed"))]
    pub download_rate_mbps: f64,

    /// Upload rate in MB/s.
    #[cfg_attr(feature = "serde", serde(rename = "uploadSpeed"))]
    pub upload_rate_mbps: f64,

    /// Cumulative bytes received, in GB.
    #[cfg_attr(feature = "serde", serde(rename = "totalDownloaded"))]
    pub total_received_gb: f64,

    /// Cumulative bytes sent, in GB.
    #[cfg_attr(feature = "serde", serde(rename = "totalUploaded"))]
    pub total_sent_gb: f64,

    /// Whether the device currently has a usable network path.
    #[cfg_attr(feature = "serde", serde(rename = "isConnected"))]
    pub is_connected: bool,

    /// When this record was produced.
    #[cfg_attr(feature = "serde", serde(rename = "lastUpdated"))]
    pub last_updated: Timestamp,
}

impl ThroughputSnapshot {
    /// Build a snapshot from a counter sample and the rates derived from it.
    ///
    /// Totals come from the sample's cumulative counters and the record is
    /// stamped with the sample's time.
    pub fn measured(sample: &CounterSample, rates: Throughput, is_connected: bool) -> Self {
        let mut snapshot = Self {
            is_connected,
            last_updated: sample.taken_at,
            ..Self::default()
        };
        snapshot.apply_sample(sample, rates);
        snapshot
    }

    /// Replace rates and totals with the values from a newer sample.
    ///
    /// Connectivity is left as is; it is owned by the path observer.
    pub fn apply_sample(&mut self, sample: &CounterSample, rates: Throughput) {
        self.download_rate_mbps = rates.download_mbps;
        self.upload_rate_mbps = rates.upload_mbps;
        self.total_received_gb = sample.received_bytes as f64 / BYTES_PER_GIGABYTE;
        self.total_sent_gb = sample.sent_bytes as f64 / BYTES_PER_GIGABYTE;
        self.last_updated = sample.taken_at;
    }

    /// The rate pair carried by this snapshot.
    pub fn rates(&self) -> Throughput {
        Throughput::new(self.download_rate_mbps, self.upload_rate_mbps)
    }
}
