//! Publication of the current snapshot into a shared store.

use std::sync::Arc;

use netpulse_types::{ThroughputSnapshot, STATS_KEY};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::store::SharedStore;

/// Writes the one live [`ThroughputSnapshot`] into a [`SharedStore`].
///
/// Both event sources of the sampler, the interval tick and the path
/// observer, go through [`update`](Self::update): it applies a change to the
/// held snapshot and overwrites the stored entry with the full record while
/// holding a single lock, so the two paths never interleave field writes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use netpulse_sdk::{MemoryStore, StatsPublisher};
///
/// let publisher = StatsPublisher::new(Arc::new(MemoryStore::new("group.example")));
///
/// // Flip connectivity without touching rates or totals
/// publisher.update(|snapshot| snapshot.is_connected = false).unwrap();
/// assert!(!publisher.current().is_connected);
/// ```
#[derive(Debug)]
pub struct StatsPublisher {
    store: Arc<dyn SharedStore>,
    current: Mutex<ThroughputSnapshot>,
}

impl StatsPublisher {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            store,
            current: Mutex::new(ThroughputSnapshot::default()),
        }
    }

    /// The store this publisher writes to.
    pub fn store(&self) -> &Arc<dyn SharedStore> {
        &self.store
    }

    /// The last snapshot handed to the store.
    pub fn current(&self) -> ThroughputSnapshot {
        *self.current.lock()
    }

    /// Overwrite the stored entry with `snapshot`.
    ///
    /// `last_updated` never moves backwards within one publisher: an older
    /// stamp is raised to the previous one.
    pub fn publish(&self, snapshot: ThroughputSnapshot) -> Result<()> {
        self.update(|current| *current = snapshot).map(|_| ())
    }

    /// Apply `change` to the held snapshot and publish the result.
    ///
    /// The new snapshot is held even if the write fails; the next publish
    /// retries the overwrite. Returns the snapshot that was written.
    pub fn update<F>(&self, change: F) -> Result<ThroughputSnapshot>
    where
        F: FnOnce(&mut ThroughputSnapshot),
    {
        let mut current = self.current.lock();
        let floor = current.last_updated;

        let mut next = *current;
        change(&mut next);
        next.last_updated = next.last_updated.max(floor);
        *current = next;

        let value = serde_json::to_value(next).map_err(|e| Error::StoreWrite(e.to_string()))?;
        self.store.write_entry(STATS_KEY, &value)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use netpulse_types::{CounterSample, Throughput, Timestamp};

    use super::*;
    use crate::store::MemoryStore;

    /// A store whose writes always fail.
    #[derive(Debug)]
    struct BrokenStore;

    impl SharedStore for BrokenStore {
        fn write_entry(&self, _key: &str, _value: &serde_json::Value) -> Result<()> {
            Err(Error::StoreWrite("group container unavailable".to_string()))
        }

        fn read_entry(&self, _key: &str) -> Result<Option<serde_json::Value>> {
            Ok(None)
        }

        fn namespace(&self) -> &str {
            "broken"
        }
    }

    fn snapshot_at(secs: u64, download: f64) -> ThroughputSnapshot {
        ThroughputSnapshot {
            download_rate_mbps: download,
            last_updated: Timestamp::from_secs(secs),
            ..ThroughputSnapshot::default()
        }
    }

    fn stored(store: &MemoryStore) -> ThroughputSnapshot {
        let value = store.read_entry(STATS_KEY).unwrap().unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_publish_overwrites_entry() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = StatsPublisher::new(store.clone());

        publisher.publish(snapshot_at(1, 1.0)).unwrap();
        publisher.publish(snapshot_at(2, 4.0)).unwrap();

        assert_eq!(stored(&store), snapshot_at(2, 4.0));
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_last_updated_never_goes_backwards() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = StatsPublisher::new(store.clone());

        publisher.publish(snapshot_at(10, 1.0)).unwrap();
        publisher.publish(snapshot_at(7, 2.0)).unwrap();

        let snapshot = stored(&store);
        assert_eq!(snapshot.download_rate_mbps, 2.0);
        assert_eq!(snapshot.last_updated, Timestamp::from_secs(10));
    }

    #[test]
    fn update_keeps_fields_it_does_not_touch() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = StatsPublisher::new(store.clone());

        let sample = CounterSample::new(1024 * 1024 * 1024, 0, Timestamp::from_secs(3));
        publisher
            .publish(ThroughputSnapshot::measured(&sample, Throughput::new(2.0, 1.0), true))
            .unwrap();

        let written = publisher.update(|s| s.is_connected = false).unwrap();

        assert!(!written.is_connected);
        assert_eq!(written.download_rate_mbps, 2.0);
        assert_eq!(written.total_received_gb, 1.0);
        assert_eq!(stored(&store), written);
    }

    #[test]
    fn failed_write_is_reported_and_snapshot_held() {
        let publisher = StatsPublisher::new(Arc::new(BrokenStore));

        let err = publisher.publish(snapshot_at(5, 3.0)).unwrap_err();

        assert!(matches!(err, Error::StoreWrite(_)));
        assert_eq!(publisher.current(), snapshot_at(5, 3.0));
    }

    #[test]
    fn concurrent_updates_produce_consistent_records() {
        let store = Arc::new(MemoryStore::new("group.test"));
        let publisher = Arc::new(StatsPublisher::new(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let publisher = publisher.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        // Both rate fields always carry the same value
                        publisher
                            .update(|s| {
                                s.download_rate_mbps = i as f64;
                                s.upload_rate_mbps = i as f64;
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stored(&store);
        assert_eq!(snapshot.download_rate_mbps, snapshot.upload_rate_mbps);
        assert_eq!(snapshot, publisher.current());
        assert_eq!(store.writes(), 800);
    }
}
