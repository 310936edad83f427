//! # netpulse
//!
//! Command-line front end for the netpulse sampler.
//!
//! The heavy lifting lives in [`netpulse_sdk`]; this crate adds the pieces a
//! standalone tool needs:
//!
//! - **[`settings`]**: layered configuration (defaults, TOML file, `NETPULSE_*` env)
//! - **[`duration`]**: human-friendly duration strings such as `500ms` or `2m`
//! - **[`report`]**: the one-line text rendering printed by `netpulse read`
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use netpulse::report::summary_line;
//! use netpulse_sdk::{
//!     CounterSample, InterfaceCounterReader, MemoryStore, SamplingScheduler, StatsPublisher,
//!     Throughput, ThroughputSnapshot, Timestamp,
//! };
//!
//! let sample = CounterSample::new(0, 0, Timestamp::now());
//! let snapshot = ThroughputSnapshot::measured(&sample, Throughput::new(2.0, 1.0), true);
//! assert_eq!(summary_line(&snapshot, false), "↓ 2.0 MB/s  ↑ 1.0 MB/s  online");
//!
//! tokio_test::block_on(async {
//!     let publisher = Arc::new(StatsPublisher::new(Arc::new(MemoryStore::new("group.example"))));
//!     let scheduler = SamplingScheduler::builder(InterfaceCounterReader::system(), publisher).build();
//!
//!     assert!(scheduler.start());
//!     assert!(!scheduler.start());
//!     assert!(scheduler.stop());
//! });
//! ```

pub mod duration;
pub mod report;
pub mod settings;

pub use settings::Settings;
pub use netpulse_types::{BYTES_PER_GIGABYTE, BYTES_PER_MEGABYTE};
