//! # netpulse-types
//!
//! Record types shared between the process that samples network counters and
//! any process that only displays the results. This crate defines the one
//! cross-process contract of netpulse: the `networkStats` entry.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to read and write the shared entry
//! - **Stable field names**: The serialized names match the entry layout exactly,
//!   so independently built readers interoperate with the publisher
//!
//! ## Example
//!
//! ```rust
//! use netpulse_types::{CounterSample, Throughput, ThroughputSnapshot, Timestamp};
//!
//! let sample = CounterSample::new(3 * 1024 * 1024 * 1024, 1024 * 1024 * 1024, Timestamp::from_secs(60));
//! let rates = Throughput::new(2.0, 1.0);
//!
//! let snapshot = ThroughputSnapshot::measured(&sample, rates, true);
//! assert_eq!(snapshot.total_received_gb, 3.0);
//! assert_eq!(snapshot.last_updated, Timestamp::from_secs(60));
//! ```
//!
//! ## Wire Layout
//!
//! With the `serde` feature enabled a snapshot serializes as:
//!
//! ```json
//! {
//!   "downloadSpeed": 2.0,
//!   "uploadSpeed": 1.0,
//!   "totalDownloaded": 3.0,
//!   "totalUploaded": 1.0,
//!   "isConnected": true,
//!   "lastUpdated": 1703160000000
//! }
//! ```
//!
//! Speeds are MB/s, totals are GB (both binary multiples), and `lastUpdated`
//! is milliseconds since the Unix epoch.

mod sample;
mod snapshot;
mod timestamp;

pub use sample::*;
pub use snapshot::*;
pub use timestamp::*;

/// Key of the single entry holding the current statistics.
pub const STATS_KEY: &str = "networkStats";

/// Default namespace shared by the sampling process and its readers.
pub const DEFAULT_GROUP_ID: &str = "group.netpulse.network-monitor";

/// Bytes in one megabyte, as used for rates.
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Bytes in one gigabyte, as used for totals.
pub const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;
