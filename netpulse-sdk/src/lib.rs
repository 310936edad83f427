//! # netpulse-sdk
//!
//! Network throughput sampling and cross-process publication.
//!
//! This crate reads cumulative byte counters from the host's network
//! interfaces, turns consecutive samples into MB/s rates, and publishes the
//! result as a single record in a shared store that other processes poll.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use netpulse_sdk::{FileStore, InterfaceCounterReader, SamplingScheduler, StatsPublisher};
//!
//! #[tokio::main]
//! async fn main() {
//!     // The namespace every reader will look in
//!     let store = Arc::new(FileStore::new("/tmp/netpulse", "group.example"));
//!     let publisher = Arc::new(StatsPublisher::new(store));
//!
//!     // Sample once per second
//!     let scheduler = SamplingScheduler::builder(InterfaceCounterReader::system(), publisher)
//!         .interval(Duration::from_secs(1))
//!         .build();
//!
//!     // Start background sampling (non-blocking)
//!     scheduler.start();
//!
//!     // ... your application runs ...
//! }
//! ```
//!
//! And from any other process:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netpulse_sdk::{FileStore, InterfaceCounterReader, StatsReader};
//!
//! let store = Arc::new(FileStore::new("/tmp/netpulse", "group.example"));
//! let mut reader = StatsReader::new(store, InterfaceCounterReader::system());
//!
//! let snapshot = reader.read();
//! println!("down {:.1} MB/s", snapshot.download_rate_mbps);
//! ```
//!
//! ## Features
//!
//! - **Device-wide totals**: Sums every active, non-loopback interface
//! - **Reset tolerant**: Counter resets and wraps read as zero rate, never negative
//! - **Atomic records**: Readers never observe a half-written snapshot
//! - **Graceful degradation**: Every failure falls back to zero, the previous
//!   rate, or a direct measurement

mod counters;
mod error;
mod estimator;
mod publisher;
mod reader;
mod scheduler;
mod store;

#[cfg(feature = "tokio")]
pub mod link;

pub use counters::{aggregate, CounterSource, InterfaceCounterReader, InterfaceCounters, SysinfoSource};
pub use error::{Error, Result};
pub use estimator::{estimate, try_estimate};
pub use publisher::StatsPublisher;
pub use reader::{Origin, StatsReader, DEFAULT_STALE_AFTER};
pub use scheduler::{
    Pipeline, SamplingScheduler, SamplingSchedulerBuilder, SchedulerState, DEFAULT_INTERVAL,
    DEFAULT_LINK_POLL,
};
pub use store::{FileStore, MemoryStore, SharedStore};

// Re-export types for convenience
pub use netpulse_types::{
    CounterSample, Throughput, ThroughputSnapshot, Timestamp, DEFAULT_GROUP_ID, STATS_KEY,
};
