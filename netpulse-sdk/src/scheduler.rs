//! The sampling scheduler: reader, estimator and publisher on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use netpulse_types::{CounterSample, Throughput, ThroughputSnapshot, Timestamp};
#[cfg(feature = "tokio")]
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::counters::InterfaceCounterReader;
use crate::estimator;
use crate::publisher::StatsPublisher;

#[cfg(feature = "tokio")]
use tokio::sync::watch;
#[cfg(feature = "tokio")]
use tokio::task::JoinHandle;
#[cfg(feature = "tokio")]
use tracing::info;

/// Default sampling period for interactive displays.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default period of the built-in link-state watcher.
pub const DEFAULT_LINK_POLL: Duration = Duration::from_secs(2);

/// One sampling step: sample, estimate against the previous sample, publish.
///
/// The pipeline owns the previous sample and the held rate. It is moved into
/// the tick task, which makes that task the only writer of this state.
///
/// Only real samples become the previous sample. A failed read publishes a
/// zero sample for that tick and leaves the comparison point alone, so the
/// next good read is measured against the last good one.
#[derive(Debug)]
pub struct Pipeline {
    counters: InterfaceCounterReader,
    publisher: Arc<StatsPublisher>,
    previous: Option<CounterSample>,
    rates: Throughput,
}

impl Pipeline {
    /// Start a pipeline from a baseline sample.
    pub fn new(
        counters: InterfaceCounterReader,
        publisher: Arc<StatsPublisher>,
        baseline: CounterSample,
    ) -> Self {
        Self {
            previous: Some(baseline),
            ..Self::unprimed(counters, publisher)
        }
    }

    /// Start a pipeline without a baseline. The first good sample becomes
    /// the baseline and reports zero rates.
    pub fn unprimed(counters: InterfaceCounterReader, publisher: Arc<StatsPublisher>) -> Self {
        Self {
            counters,
            publisher,
            previous: None,
            rates: Throughput::ZERO,
        }
    }

    /// The sample the next tick will be compared against.
    pub fn previous(&self) -> Option<&CounterSample> {
        self.previous.as_ref()
    }

    /// Publish the baseline with zero rates, or a zero sample without one.
    pub fn publish_baseline(&self, is_connected: bool) -> ThroughputSnapshot {
        let baseline = self
            .previous
            .unwrap_or_else(|| CounterSample::zero(Timestamp::now()));
        let snapshot = ThroughputSnapshot::measured(&baseline, Throughput::ZERO, is_connected);
        self.publish(|current| *current = snapshot)
    }

    /// Take a fresh sample and advance to it.
    pub fn tick(&mut self) -> ThroughputSnapshot {
        match self.counters.try_sample() {
            Ok(current) => self.advance(current),
            Err(e) => {
                warn!(error = %e, "interface enumeration failed, publishing zero sample");
                self.degrade(Timestamp::now())
            }
        }
    }

    /// Advance to `current`, publish, and keep it as the new previous sample.
    pub fn advance(&mut self, current: CounterSample) -> ThroughputSnapshot {
        if let Some(previous) = self.previous {
            self.rates = match estimator::try_estimate(&previous, &current) {
                Ok(rates) => rates,
                Err(e) => {
                    warn!(error = %e, "holding previous rate");
                    self.rates
                }
            };
        }
        self.previous = Some(current);

        let rates = self.rates;
        let snapshot = self.publish(|snapshot| snapshot.apply_sample(&current, rates));
        debug!(
            download_mbps = snapshot.download_rate_mbps,
            upload_mbps = snapshot.upload_rate_mbps,
            "published sample"
        );
        snapshot
    }

    /// Publish a zero sample for a tick whose read failed.
    ///
    /// The previous sample and the held rate are kept.
    pub fn degrade(&self, taken_at: Timestamp) -> ThroughputSnapshot {
        let sample = CounterSample::zero(taken_at);
        self.publish(|snapshot| snapshot.apply_sample(&sample, Throughput::ZERO))
    }

    fn publish<F>(&self, change: F) -> ThroughputSnapshot
    where
        F: FnOnce(&mut ThroughputSnapshot),
    {
        match self.publisher.update(change) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "publish failed, retrying next tick");
                self.publisher.current()
            }
        }
    }
}

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Drives the sampling pipeline on a fixed period.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use netpulse_sdk::{FileStore, InterfaceCounterReader, SamplingScheduler, StatsPublisher};
///
/// #[tokio::main]
/// async fn main() {
///     let store = Arc::new(FileStore::new("/tmp/netpulse", "group.example"));
///     let publisher = Arc::new(StatsPublisher::new(store));
///
///     let scheduler = SamplingScheduler::builder(InterfaceCounterReader::system(), publisher)
///         .interval(Duration::from_secs(1))
///         .build();
///
///     scheduler.start();
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     scheduler.stop();
/// }
/// ```
#[derive(Debug)]
pub struct SamplingScheduler {
    counters: InterfaceCounterReader,
    publisher: Arc<StatsPublisher>,
    interval: Duration,
    link_poll: Option<Duration>,
    #[cfg(feature = "tokio")]
    path_updates: Option<watch::Receiver<bool>>,
    #[cfg(feature = "tokio")]
    running: Mutex<Option<Running>>,
}

#[cfg(feature = "tokio")]
#[derive(Debug)]
struct Running {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SamplingScheduler {
    /// Create a builder for configuring the scheduler.
    pub fn builder(
        counters: InterfaceCounterReader,
        publisher: Arc<StatsPublisher>,
    ) -> SamplingSchedulerBuilder {
        SamplingSchedulerBuilder::new(counters, publisher)
    }

    /// The sampling period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The publisher this scheduler writes through.
    pub fn publisher(&self) -> &Arc<StatsPublisher> {
        &self.publisher
    }
}

#[cfg(feature = "tokio")]
impl SamplingScheduler {
    /// Start sampling.
    ///
    /// Takes the baseline sample, publishes it, and spawns the tick task and
    /// the path observer. Returns `false` without doing anything if already
    /// running, so the baseline and timer are never replaced.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            debug!("scheduler already running");
            return false;
        }

        let pipeline = match self.counters.try_sample() {
            Ok(baseline) => Pipeline::new(self.counters.clone(), self.publisher.clone(), baseline),
            Err(e) => {
                warn!(error = %e, "baseline sample failed, first good tick becomes the baseline");
                Pipeline::unprimed(self.counters.clone(), self.publisher.clone())
            }
        };

        // The path observer owns connectivity; without one, any active interface counts
        let mut external = self.path_updates.clone();
        let connected = match external.as_mut() {
            Some(rx) => *rx.borrow_and_update(),
            None => pipeline.previous().is_some_and(|b| b.active_interfaces > 0),
        };
        pipeline.publish_baseline(connected);

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = vec![tokio::spawn(run_ticks(pipeline, self.interval, stop_rx.clone()))];

        let path_updates = match (external, self.link_poll) {
            (Some(rx), _) => Some(rx),
            (None, Some(period)) => {
                let watcher = crate::link::LinkWatcher::new(self.counters.clone(), period);
                let (rx, handle) = watcher.spawn(connected, stop_rx.clone());
                tasks.push(handle);
                Some(rx)
            }
            (None, None) => None,
        };
        if let Some(rx) = path_updates {
            tasks.push(tokio::spawn(run_path_updates(
                rx,
                self.publisher.clone(),
                stop_rx,
            )));
        }

        info!(interval = ?self.interval, "sampling started");
        *running = Some(Running { stop_tx, tasks });
        true
    }

    /// Stop sampling.
    ///
    /// No tick starts after this returns; a tick already in progress is
    /// allowed to finish. Returns `false` if already stopped.
    pub fn stop(&self) -> bool {
        let Some(running) = self.running.lock().take() else {
            return false;
        };
        let _ = running.stop_tx.send(true);
        drop(running.tasks);
        info!("sampling stopped");
        true
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.lock().is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }
}

#[cfg(feature = "tokio")]
impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "tokio")]
async fn run_ticks(mut pipeline: Pipeline, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    use tokio::time::{self, MissedTickBehavior};

    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *stop_rx.borrow() {
                    break;
                }
                pipeline.tick();
            }
        }
    }
}

#[cfg(feature = "tokio")]
async fn run_path_updates(
    mut path_rx: watch::Receiver<bool>,
    publisher: Arc<StatsPublisher>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            changed = path_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let connected = *path_rx.borrow_and_update();
                if let Err(e) = publisher.update(|snapshot| snapshot.is_connected = connected) {
                    warn!(error = %e, "publish after path change failed");
                }
            }
        }
    }
}

/// Builder for configuring a [`SamplingScheduler`].
#[derive(Debug)]
pub struct SamplingSchedulerBuilder {
    counters: InterfaceCounterReader,
    publisher: Arc<StatsPublisher>,
    interval: Option<Duration>,
    link_poll: Option<Option<Duration>>,
    #[cfg(feature = "tokio")]
    path_updates: Option<watch::Receiver<bool>>,
}

impl SamplingSchedulerBuilder {
    pub fn new(counters: InterfaceCounterReader, publisher: Arc<StatsPublisher>) -> Self {
        Self {
            counters,
            publisher,
            interval: None,
            link_poll: None,
            #[cfg(feature = "tokio")]
            path_updates: None,
        }
    }

    /// Set the sampling period.
    ///
    /// Defaults to 1 second if not specified. `Duration::ZERO` is not a
    /// usable period and also selects the default.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set how often the built-in link watcher polls. `Duration::ZERO`
    /// disables it.
    ///
    /// Defaults to 2 seconds. Ignored when [`path_updates`](Self::path_updates)
    /// is set.
    pub fn link_poll(mut self, period: Duration) -> Self {
        self.link_poll = Some((!period.is_zero()).then_some(period));
        self
    }

    /// Drive connectivity from an external path-status source instead of the
    /// built-in watcher.
    #[cfg(feature = "tokio")]
    pub fn path_updates(mut self, rx: watch::Receiver<bool>) -> Self {
        self.path_updates = Some(rx);
        self
    }

    /// Build the scheduler, initially stopped.
    pub fn build(self) -> SamplingScheduler {
        SamplingScheduler {
            counters: self.counters,
            publisher: self.publisher,
            interval: self
                .interval
                .filter(|period| !period.is_zero())
                .unwrap_or(DEFAULT_INTERVAL),
            link_poll: self.link_poll.unwrap_or(Some(DEFAULT_LINK_POLL)),
            #[cfg(feature = "tokio")]
            path_updates: self.path_updates,
            #[cfg(feature = "tokio")]
            running: Mutex::new(None),
        }
    }
}
