//! Path-status observation.
//!
//! Connectivity changes are reported independently of the sampling tick. The
//! built-in watcher polls interface link state and only wakes subscribers on
//! a transition.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::counters::InterfaceCounterReader;

/// Polls link state and publishes transitions on a watch channel.
#[derive(Debug, Clone)]
pub struct LinkWatcher {
    counters: InterfaceCounterReader,
    period: Duration,
}

impl LinkWatcher {
    pub fn new(counters: InterfaceCounterReader, period: Duration) -> Self {
        Self { counters, period }
    }

    /// Spawn the polling task.
    ///
    /// The returned receiver starts at `initial` and changes only when the
    /// observed state flips. The task exits once `stop` turns true or its
    /// sender is dropped.
    pub fn spawn(
        self,
        initial: bool,
        mut stop: watch::Receiver<bool>,
    ) -> (watch::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        // An enumeration failure says nothing about the link
                        let Some(up) = self.counters.link_up() else { continue };
                        tx.send_if_modified(|current| {
                            if *current == up {
                                return false;
                            }
                            info!(connected = up, "network path changed");
                            *current = up;
                            true
                        });
                    }
                }
            }
        });

        (rx, handle)
    }
}
