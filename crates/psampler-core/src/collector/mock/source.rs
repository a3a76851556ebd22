//! Static in-memory process source with injectable per-process failures.

use crate::collector::source::{ProcessHandle, ProcessReadError, ProcessSource};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Which read of a [`StaticProcess`] fails, and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    /// `name()` reports the process as gone.
    VanishedOnName,
    /// `cpu_percent()` reports access denied.
    DeniedOnCpu,
    /// `resident_memory_bytes()` reports a zombie.
    ZombieOnMemory,
}

/// Fixed process returned by [`StaticSource`] on every enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub failure: Option<Failure>,
}

impl StaticProcess {
    pub fn new(pid: u32, name: impl Into<String>, cpu_percent: f64, memory_bytes: u64) -> Self {
        Self {
            pid,
            name: name.into(),
            cpu_percent,
            memory_bytes,
            failure: None,
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }
}

impl ProcessHandle for StaticProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> Result<String, ProcessReadError> {
        match self.failure {
            Some(Failure::VanishedOnName) => Err(ProcessReadError::NoSuchProcess(self.pid)),
            _ => Ok(self.name.clone()),
        }
    }

    fn cpu_percent(&self, window: Duration) -> Result<f64, ProcessReadError> {
        if !window.is_zero() {
            std::thread::sleep(window);
        }
        match self.failure {
            Some(Failure::DeniedOnCpu) => Err(ProcessReadError::AccessDenied(self.pid)),
            _ => Ok(self.cpu_percent),
        }
    }

    fn resident_memory_bytes(&self) -> Result<u64, ProcessReadError> {
        match self.failure {
            Some(Failure::ZombieOnMemory) => Err(ProcessReadError::Zombie(self.pid)),
            _ => Ok(self.memory_bytes),
        }
    }
}

/// Process source that returns the same fixed process table every time.
///
/// Clones share the enumeration failure switch, so a test can keep one clone
/// and flip [`StaticSource::set_unavailable`] while a worker owns another.
#[derive(Debug, Clone)]
pub struct StaticSource {
    processes: Vec<StaticProcess>,
    cores: usize,
    unavailable: Arc<AtomicBool>,
}

impl StaticSource {
    pub fn new(processes: Vec<StaticProcess>) -> Self {
        Self {
            processes,
            cores: 1,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// Makes `processes()` fail as if the process table could not be read.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl ProcessSource for StaticSource {
    type Handle = StaticProcess;

    fn processes(&self) -> io::Result<Box<dyn Iterator<Item = StaticProcess> + '_>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(io::Error::other("process table unavailable"));
        }
        Ok(Box::new(self.processes.iter().cloned()))
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}
