//! One-shot enumeration of the process table into a [`Batch`].

use crate::collector::source::{ProcessHandle, ProcessReadError, ProcessSource};
use crate::storage::model::{Batch, Sample};
use chrono::{Local, NaiveDateTime};
use std::io;
use std::time::Duration;
use tracing::trace;

/// Default CPU measurement window per process.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(100);

/// The process list itself could not be obtained.
#[derive(Debug)]
pub enum SnapshotError {
    Enumeration(io::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Enumeration(e) => write!(f, "cannot enumerate processes: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Turns every live process of a [`ProcessSource`] into a [`Sample`].
pub struct Snapshotter<S: ProcessSource> {
    source: S,
    cpu_window: Duration,
}

impl<S: ProcessSource> Snapshotter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }

    pub fn with_cpu_window(mut self, cpu_window: Duration) -> Self {
        self.cpu_window = cpu_window;
        self
    }

    /// Takes one snapshot, stamped with the current local time.
    pub fn snapshot(&self, core_count: usize) -> Result<Batch, SnapshotError> {
        self.snapshot_at(Local::now().naive_local(), core_count)
    }

    /// Takes one snapshot with an explicit timestamp.
    ///
    /// Processes that vanish, deny access or fail any read are left out of
    /// the batch; only a failure to list processes is an error.
    pub fn snapshot_at(
        &self,
        timestamp: NaiveDateTime,
        core_count: usize,
    ) -> Result<Batch, SnapshotError> {
        let cores = core_count.max(1) as f64;
        let handles = self
            .source
            .processes()
            .map_err(SnapshotError::Enumeration)?;

        let samples = handles
            .map(|handle| self.read_sample(&handle, timestamp, cores))
            .filter_map(|outcome| match outcome {
                Ok(sample) => Some(sample),
                Err(e) => {
                    trace!("Skipping process: {}", e);
                    None
                }
            })
            .collect();

        Ok(Batch { timestamp, samples })
    }

    fn read_sample(
        &self,
        handle: &S::Handle,
        timestamp: NaiveDateTime,
        cores: f64,
    ) -> Result<Sample, ProcessReadError> {
        let pid = handle.pid();
        let name = handle.name()?;
        let cpu_usage = handle.cpu_percent(self.cpu_window)? / cores;
        let memory_mb = Sample::bytes_to_mb(handle.resident_memory_bytes()?);

        Ok(Sample {
            timestamp,
            pid,
            name,
            cpu_usage,
            memory_mb,
        })
    }
}
