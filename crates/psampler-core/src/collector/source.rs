//! Process source abstraction: a lazy sequence of per-process handles.
//!
//! Each handle reads its counters independently, so one process vanishing or
//! denying access never invalidates the rest of the sequence.

use std::io;
use std::time::Duration;

/// Error reading a single process. Always recovered by skipping the process.
#[derive(Debug)]
pub enum ProcessReadError {
    /// Process exited between enumeration and the read.
    NoSuchProcess(u32),
    /// The caller is not allowed to read this process.
    AccessDenied(u32),
    /// Process has exited but not been reaped.
    Zombie(u32),
    /// Any other per-process failure (malformed counters, unexpected I/O).
    Other(u32, String),
}

impl ProcessReadError {
    /// Maps an I/O error from reading a process file to the matching variant.
    pub fn from_io(pid: u32, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ProcessReadError::NoSuchProcess(pid),
            io::ErrorKind::PermissionDenied => ProcessReadError::AccessDenied(pid),
            _ => ProcessReadError::Other(pid, err.to_string()),
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            ProcessReadError::NoSuchProcess(pid)
            | ProcessReadError::AccessDenied(pid)
            | ProcessReadError::Zombie(pid)
            | ProcessReadError::Other(pid, _) => *pid,
        }
    }
}

impl std::fmt::Display for ProcessReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessReadError::NoSuchProcess(pid) => write!(f, "process {} disappeared", pid),
            ProcessReadError::AccessDenied(pid) => write!(f, "access to process {} denied", pid),
            ProcessReadError::Zombie(pid) => write!(f, "process {} is a zombie", pid),
            ProcessReadError::Other(pid, msg) => write!(f, "process {}: {}", pid, msg),
        }
    }
}

impl std::error::Error for ProcessReadError {}

/// One live process as seen at enumeration time.
pub trait ProcessHandle {
    fn pid(&self) -> u32;

    /// Executable name as currently reported by the OS.
    fn name(&self) -> Result<String, ProcessReadError>;

    /// CPU usage in percent of one core, measured over `window`.
    ///
    /// Blocks the calling thread for roughly `window`.
    fn cpu_percent(&self, window: Duration) -> Result<f64, ProcessReadError>;

    /// Resident set size in bytes.
    fn resident_memory_bytes(&self) -> Result<u64, ProcessReadError>;
}

/// Capability that enumerates the live process table.
pub trait ProcessSource: Send {
    type Handle: ProcessHandle;

    /// Returns a lazy, non-restartable sequence of handles.
    ///
    /// An error here means the process list itself could not be obtained.
    fn processes(&self) -> io::Result<Box<dyn Iterator<Item = Self::Handle> + '_>>;

    /// Number of logical CPUs used to normalise CPU usage.
    fn core_count(&self) -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_error_kinds() {
        let gone = io::Error::new(io::ErrorKind::NotFound, "gone");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let other = io::Error::other("boom");

        assert!(matches!(
            ProcessReadError::from_io(7, &gone),
            ProcessReadError::NoSuchProcess(7)
        ));
        assert!(matches!(
            ProcessReadError::from_io(7, &denied),
            ProcessReadError::AccessDenied(7)
        ));
        assert!(matches!(
            ProcessReadError::from_io(7, &other),
            ProcessReadError::Other(7, _)
        ));
    }

    #[test]
    fn test_display_names_pid() {
        assert_eq!(
            ProcessReadError::Zombie(12).to_string(),
            "process 12 is a zombie"
        );
        assert_eq!(ProcessReadError::AccessDenied(3).pid(), 3);
    }
}
