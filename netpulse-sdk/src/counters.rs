//! Interface counter acquisition.
//!
//! The OS keeps cumulative byte counters per network interface. This module
//! enumerates them, drops loopback and inactive interfaces, and sums what is
//! left into a single [`CounterSample`]. Summing across links is intended:
//! the figure tracks total device traffic, not one interface.

use std::fmt::Debug;
use std::sync::Arc;

use netpulse_types::{CounterSample, Timestamp};
use parking_lot::Mutex;
use sysinfo::Networks;
use tracing::warn;

use crate::error::Result;

#[cfg(target_os = "linux")]
const IFF_UP: u32 = 0x1;
#[cfg(target_os = "linux")]
const IFF_RUNNING: u32 = 0x40;

/// Counters and state for one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub received_bytes: u64,
    pub sent_bytes: u64,
    /// Administratively up.
    pub is_up: bool,
    /// Operationally running (link present).
    pub is_running: bool,
    pub is_loopback: bool,
}

impl InterfaceCounters {
    /// Whether this interface contributes to the device totals.
    pub fn is_active(&self) -> bool {
        !self.is_loopback && self.is_up && self.is_running
    }
}

/// Trait for platform-specific interface enumeration.
///
/// The production implementation is [`SysinfoSource`]; tests substitute
/// scripted sources.
pub trait CounterSource: Send + Sync + Debug {
    /// List every interface the OS reports, active or not.
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>>;
}

/// Interface enumeration backed by `sysinfo`.
#[derive(Debug)]
pub struct SysinfoSource {
    networks: Mutex<Networks>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoSource {
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>> {
        let mut networks = self.networks.lock();
        networks.refresh(true);

        let interfaces = networks
            .iter()
            .map(|(name, data)| {
                let addresses = data.ip_networks();
                let has_address = !addresses.is_empty();
                let is_loopback = name.starts_with("lo")
                    || (has_address && addresses.iter().all(|net| net.addr.is_loopback()));
                let (is_up, is_running) =
                    link_flags(name).unwrap_or((has_address, has_address));

                InterfaceCounters {
                    name: name.clone(),
                    received_bytes: data.total_received(),
                    sent_bytes: data.total_transmitted(),
                    is_up,
                    is_running,
                    is_loopback,
                }
            })
            .collect();

        Ok(interfaces)
    }
}

/// Read the up/running bits from sysfs.
#[cfg(target_os = "linux")]
fn link_flags(name: &str) -> Option<(bool, bool)> {
    let raw = std::fs::read_to_string(format!("/sys/class/net/{}/flags", name)).ok()?;
    let flags = u32::from_str_radix(raw.trim().trim_start_matches("0x"), 16).ok()?;
    Some((flags & IFF_UP != 0, flags & IFF_RUNNING != 0))
}

#[cfg(not(target_os = "linux"))]
fn link_flags(_name: &str) -> Option<(bool, bool)> {
    None
}

/// Filter to active interfaces and sum their counters.
pub fn aggregate(interfaces: &[InterfaceCounters], taken_at: Timestamp) -> CounterSample {
    let mut received = 0u64;
    let mut sent = 0u64;
    let mut active = 0u32;

    for iface in interfaces.iter().filter(|i| i.is_active()) {
        received = received.saturating_add(iface.received_bytes);
        sent = sent.saturating_add(iface.sent_bytes);
        active += 1;
    }

    CounterSample::new(received, sent, taken_at).with_active_interfaces(active)
}

/// Reads device-wide counter samples from a [`CounterSource`].
///
/// # Example
///
/// ```rust
/// use netpulse_sdk::InterfaceCounterReader;
///
/// let reader = InterfaceCounterReader::system();
/// let sample = reader.sample();
/// println!("{} bytes received so far", sample.received_bytes);
/// ```
#[derive(Debug, Clone)]
pub struct InterfaceCounterReader {
    source: Arc<dyn CounterSource>,
}

impl InterfaceCounterReader {
    pub fn new(source: Arc<dyn CounterSource>) -> Self {
        Self { source }
    }

    /// A reader over the host's real interfaces.
    pub fn system() -> Self {
        Self::new(Arc::new(SysinfoSource::new()))
    }

    /// Take a sample, surfacing enumeration failures.
    pub fn try_sample(&self) -> Result<CounterSample> {
        let interfaces = self.source.interfaces()?;
        Ok(aggregate(&interfaces, Timestamp::now()))
    }

    /// Take a sample, degrading to a zero sample if enumeration fails.
    pub fn sample(&self) -> CounterSample {
        match self.try_sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "interface enumeration failed, using zero sample");
                CounterSample::zero(Timestamp::now())
            }
        }
    }

    /// Whether any active interface exists. `None` if enumeration failed.
    pub fn link_up(&self) -> Option<bool> {
        match self.source.interfaces() {
            Ok(interfaces) => Some(interfaces.iter().any(InterfaceCounters::is_active)),
            Err(e) => {
                warn!(error = %e, "interface enumeration failed during link check");
                None
            }
        }
    }
}
