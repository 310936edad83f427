//! Consumer-side access to the published snapshot.
//!
//! A satellite process may run without the sampling process ever having
//! started, so reading falls back to a single direct measurement when no
//! usable record is published.

use std::sync::Arc;
use std::time::Duration;

use netpulse_types::{Throughput, ThroughputSnapshot, Timestamp, STATS_KEY};
use tracing::{debug, warn};

use crate::counters::InterfaceCounterReader;
use crate::error::Error;
use crate::store::SharedStore;

/// Published records older than this are ignored by default.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(120);

/// Where a snapshot returned by [`StatsReader`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read from the shared store, as written by the publisher.
    Published,
    /// Measured directly because no usable record was published.
    Measured,
}

/// Reads the latest snapshot, measuring directly when none is available.
///
/// A direct measurement is a single counter sample, so it carries zero rates
/// and only the totals. Connectivity is approximated by whether any active
/// non-loopback interface exists.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use netpulse_sdk::{InterfaceCounterReader, MemoryStore, Origin, StatsReader};
///
/// let store = Arc::new(MemoryStore::new("group.example"));
/// let mut reader = StatsReader::new(store, InterfaceCounterReader::system());
///
/// // Nothing has been published yet
/// let (snapshot, origin) = reader.read_with_origin();
/// assert_eq!(origin, Origin::Measured);
/// assert_eq!(snapshot.download_rate_mbps, 0.0);
/// ```
#[derive(Debug)]
pub struct StatsReader {
    store: Arc<dyn SharedStore>,
    counters: InterfaceCounterReader,
    stale_after: Option<Duration>,
    last_error: Option<String>,
}

impl StatsReader {
    /// Create a reader with the default staleness limit.
    pub fn new(store: Arc<dyn SharedStore>, counters: InterfaceCounterReader) -> Self {
        Self {
            store,
            counters,
            stale_after: Some(DEFAULT_STALE_AFTER),
            last_error: None,
        }
    }

    /// Ignore published records older than `limit`. `Duration::ZERO` accepts
    /// records of any age.
    pub fn stale_after(mut self, limit: Duration) -> Self {
        self.stale_after = (!limit.is_zero()).then_some(limit);
        self
    }

    /// Read the current snapshot.
    pub fn read(&mut self) -> ThroughputSnapshot {
        self.read_with_origin().0
    }

    /// Read the current snapshot and report where it came from.
    pub fn read_with_origin(&mut self) -> (ThroughputSnapshot, Origin) {
        match self.read_published() {
            Ok(Some(snapshot)) => {
                self.last_error = None;
                (snapshot, Origin::Published)
            }
            Ok(None) => {
                self.last_error = None;
                debug!(namespace = self.store.namespace(), "no published snapshot, measuring directly");
                (self.measure(), Origin::Measured)
            }
            Err(e) => {
                warn!(error = %e, "published snapshot unusable, measuring directly");
                self.last_error = Some(e.to_string());
                (self.measure(), Origin::Measured)
            }
        }
    }

    /// Why the last read could not use the published record, if it could not.
    ///
    /// A record that simply does not exist yet is not an error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn read_published(&self) -> crate::Result<Option<ThroughputSnapshot>> {
        let Some(value) = self.store.read_entry(STATS_KEY)? else {
            return Ok(None);
        };

        let snapshot: ThroughputSnapshot =
            serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))?;

        if let Some(limit) = self.stale_after {
            let age = snapshot.last_updated.age(Timestamp::now());
            if age > limit {
                return Err(Error::StoreRead(format!(
                    "record is stale ({}s old, limit {}s)",
                    age.as_secs(),
                    limit.as_secs()
                )));
            }
        }

        Ok(Some(snapshot))
    }

    fn measure(&self) -> ThroughputSnapshot {
        let sample = self.counters.sample();
        ThroughputSnapshot::measured(&sample, Throughput::ZERO, sample.active_interfaces > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::testing::{iface, ScriptedSource};
    use crate::publisher::StatsPublisher;
    use crate::store::MemoryStore;
    use netpulse_types::BYTES_PER_GIGABYTE;
    use serde_json::json;

    fn scripted(received: u64, sent: u64) -> InterfaceCounterReader {
        let source = ScriptedSource::new();
        source.push(vec![iface("en0", received, sent)]);
        InterfaceCounterReader::new(Arc::new(source))
    }

    fn fresh_snapshot() -> ThroughputSnapshot {
        ThroughputSnapshot {
            download_rate_mbps: 2.0,
            upload_rate_mbps: 1.0,
            total_received_gb: 3.5,
            total_sent_gb: 0.5,
            is_connected: true,
            last_updated: Timestamp::now(),
        }
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = StatsPublisher::new(store.clone());
        let snapshot = fresh_snapshot();
        publisher.publish(snapshot).unwrap();

        let mut reader = StatsReader::new(store, scripted(0, 0));
        let (read, origin) = reader.read_with_origin();

        assert_eq!(origin, Origin::Published);
        assert_eq!(read, snapshot);
        assert!(reader.last_error().is_none());
    }

    #[test]
    fn test_no_publish_falls_back_to_measurement() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let received = 2 * 1024 * 1024 * 1024;
        let sent = 1024 * 1024 * 1024;
        let mut reader = StatsReader::new(store, scripted(received, sent));

        let (snapshot, origin) = reader.read_with_origin();

        assert_eq!(origin, Origin::Measured);
        assert_eq!(snapshot.download_rate_mbps, 0.0);
        assert_eq!(snapshot.upload_rate_mbps, 0.0);
        assert_eq!(snapshot.total_received_gb, received as f64 / BYTES_PER_GIGABYTE);
        assert_eq!(snapshot.total_sent_gb, 1.0);
        assert!(snapshot.is_connected);
        assert!(reader.last_error().is_none());
    }

    #[test]
    fn fallback_connectivity_follows_interfaces_not_traffic() {
        let source = ScriptedSource::new();
        let mut down = iface("en0", 5_000, 5_000);
        down.is_running = false;
        source.push(vec![down]);
        let store = Arc::new(MemoryStore::new("group.test"));
        let mut reader = StatsReader::new(store, InterfaceCounterReader::new(Arc::new(source)));

        let snapshot = reader.read();

        assert!(!snapshot.is_connected);
        assert_eq!(snapshot.total_received_gb, 0.0);
    }

    #[test]
    fn fallback_survives_enumeration_failure() {
        let source = ScriptedSource::new();
        source.push_failure();
        let store = Arc::new(MemoryStore::new("group.test"));
        let mut reader = StatsReader::new(store, InterfaceCounterReader::new(Arc::new(source)));

        let snapshot = reader.read();

        assert_eq!(snapshot.total_received_gb, 0.0);
        assert_eq!(snapshot.total_sent_gb, 0.0);
        assert!(!snapshot.is_connected);
    }

    #[test]
    fn malformed_record_falls_back() {
        let store = Arc::new(MemoryStore::new("group.test"));
        store
            .write_entry(STATS_KEY, &json!({ "downloadSpeed": "fast", "uploadSpeed": 1.0 }))
            .unwrap();
        let mut reader = StatsReader::new(store, scripted(1024, 0));

        let (snapshot, origin) = reader.read_with_origin();

        assert_eq!(origin, Origin::Measured);
        assert_eq!(snapshot.download_rate_mbps, 0.0);
        assert!(reader.last_error().unwrap().contains("Malformed record"));
    }

    #[test]
    fn stale_record_falls_back() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = StatsPublisher::new(store.clone());
        let mut old = fresh_snapshot();
        old.last_updated = Timestamp::from_millis(Timestamp::now().as_millis() - 600_000);
        publisher.publish(old).unwrap();

        let mut reader = StatsReader::new(store.clone(), scripted(0, 0));
        let (_, origin) = reader.read_with_origin();
        assert_eq!(origin, Origin::Measured);
        assert!(reader.last_error().unwrap().contains("stale"));

        let mut lenient = StatsReader::new(store, scripted(0, 0)).stale_after(Duration::ZERO);
        let (snapshot, origin) = lenient.read_with_origin();
        assert_eq!(origin, Origin::Published);
        assert_eq!(snapshot, old);
    }

    #[test]
    fn error_clears_after_successful_read() {
        let store = Arc::new(MemoryStore::new("group.test"));
        store.write_entry(STATS_KEY, &json!("garbage")).unwrap();
        let mut reader = StatsReader::new(store.clone(), scripted(0, 0));

        reader.read();
        assert!(reader.last_error().is_some());

        StatsPublisher::new(store).publish(fresh_snapshot()).unwrap();
        reader.read();
        assert!(reader.last_error().is_none());
    }
}
