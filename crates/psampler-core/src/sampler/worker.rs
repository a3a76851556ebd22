//! The sampling loop run on the worker thread, and the state it shares.

use crate::collector::{ProcessSource, Snapshotter};
use crate::sampler::cancel::CancellationToken;
use crate::storage::{CsvSink, Sample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info};

/// Observable collector state, as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Collecting,
    Stopped,
    /// Collection continues, but the last tick failed.
    Error(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "Idle"),
            Status::Collecting => write!(f, "Collecting data..."),
            Status::Stopped => write!(f, "Stopped"),
            Status::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// State written by the worker and read by the controlling thread.
#[derive(Debug)]
pub struct SharedState {
    history: Mutex<Vec<Sample>>,
    status: Mutex<Status>,
    ticks: AtomicU64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(Status::Idle)
    }
}

impl SharedState {
    pub fn new(status: Status) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            status: Mutex::new(status),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> Status {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_status(&self, status: Status) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Copy of every sample collected so far.
    pub fn history(&self) -> Vec<Sample> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of completed ticks, including failed ones.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn extend_history(&self, samples: &[Sample]) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(samples);
    }

    fn finish_tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

/// Snapshot → append → sleep, until cancelled.
pub struct SamplingLoop<S: ProcessSource> {
    snapshotter: Snapshotter<S>,
    sink: CsvSink,
    interval: Duration,
    core_count: usize,
    shared: Arc<SharedState>,
}

impl<S: ProcessSource> SamplingLoop<S> {
    pub fn new(
        snapshotter: Snapshotter<S>,
        sink: CsvSink,
        interval: Duration,
        core_count: usize,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            snapshotter,
            sink,
            interval,
            core_count,
            shared,
        }
    }

    /// Runs until `cancel` is observed.
    ///
    /// Cancellation is checked before each tick and while sleeping between
    /// ticks; an in-flight snapshot and append always complete.
    pub fn run(mut self, cancel: &CancellationToken) {
        info!(
            "Sampling every {}s into {} ({} cores)",
            self.interval.as_secs(),
            self.sink.path().display(),
            self.core_count
        );

        while !cancel.is_cancelled() {
            self.tick();
            cancel.sleep(self.interval);
        }

        info!("Sampling loop stopped after {} ticks", self.shared.ticks());
    }

    /// One snapshot and append. Failures are reported, never fatal.
    pub fn tick(&mut self) {
        let batch = match self.snapshotter.snapshot(self.core_count) {
            Ok(batch) => batch,
            Err(e) => {
                error!("Snapshot failed: {}", e);
                self.shared.set_status(Status::Error(e.to_string()));
                self.shared.finish_tick();
                return;
            }
        };

        self.shared.extend_history(&batch.samples);

        match self.sink.append(&batch) {
            Ok(()) => {
                debug!(
                    "Tick #{}: {} processes at {}",
                    self.shared.ticks() + 1,
                    batch.len(),
                    batch.timestamp
                );
                self.shared.set_status(Status::Collecting);
            }
            Err(e) => {
                error!("Error writing to {}: {}", self.sink.path().display(), e);
                self.shared
                    .set_status(Status::Error(format!("writing to CSV failed: {}", e)));
            }
        }
        self.shared.finish_tick();
    }
}
