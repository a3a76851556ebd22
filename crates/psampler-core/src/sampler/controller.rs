//! Start/stop lifecycle around one sampling worker thread.

use crate::collector::{ProcessSource, Snapshotter};
use crate::sampler::cancel::CancellationToken;
use crate::sampler::config::{ConfigError, SamplerConfig};
use crate::sampler::worker::{SamplingLoop, SharedState, Status};
use crate::storage::{CsvSink, Sample};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one running [`SamplingLoop`].
///
/// `start` returns as soon as the worker is spawned; `stop` blocks until the
/// worker has exited, so nothing is written to the store after it returns.
pub struct Controller<S: ProcessSource + Clone + 'static> {
    source: S,
    shared: Arc<SharedState>,
    worker: Option<Worker>,
}

impl<S: ProcessSource + Clone + 'static> Controller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            shared: Arc::new(SharedState::default()),
            worker: None,
        }
    }

    /// Validates `config` and starts sampling on a background thread.
    pub fn start(&mut self, config: SamplerConfig) -> Result<(), ConfigError> {
        if self.is_running() {
            return Err(ConfigError::AlreadyRunning);
        }
        config.validate()?;

        let core_count = config
            .core_count
            .unwrap_or_else(|| self.source.core_count());
        let snapshotter =
            Snapshotter::new(self.source.clone()).with_cpu_window(config.cpu_window);
        let sink = CsvSink::in_dir(&config.location, &config.filename);

        let shared = Arc::new(SharedState::new(Status::Collecting));
        let sampling = SamplingLoop::new(
            snapshotter,
            sink,
            config.interval(),
            core_count,
            Arc::clone(&shared),
        );

        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("sampler".to_string())
            .spawn(move || sampling.run(&worker_cancel))
            .map_err(ConfigError::Spawn)?;

        info!(
            "Collection started: interval={}s, store={}",
            config.interval_secs,
            config.store_path().display()
        );

        self.shared = shared;
        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Cancels the worker and waits for it to exit. No-op when idle.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.cancel.cancel();
        if worker.handle.join().is_err() {
            error!("Sampling thread panicked");
        }

        self.shared.set_status(Status::Stopped);
        info!(
            "Collection stopped: {} ticks, {} samples",
            self.shared.ticks(),
            self.shared.history_len()
        );
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn status(&self) -> Status {
        self.shared.status()
    }

    /// Samples collected by the current (or last) session.
    pub fn history(&self) -> Vec<Sample> {
        self.shared.history()
    }

    pub fn history_len(&self) -> usize {
        self.shared.history_len()
    }

    /// Ticks completed by the current (or last) session.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks()
    }
}

impl<S: ProcessSource + Clone + 'static> Drop for Controller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
