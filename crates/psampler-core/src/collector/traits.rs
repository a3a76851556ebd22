//! Read-only filesystem seam between the procfs source and `/proc`.
//!
//! Production code reads through [`RealFs`]; tests substitute the in-memory
//! `MockFs`.

use std::io;
use std::path::{Path, PathBuf};

/// The two filesystem reads a process source performs.
pub trait FileSystem: Send + Sync {
    /// Whole-file read. Invalid UTF-8 is replaced with U+FFFD, since process
    /// names are arbitrary bytes.
    ///
    /// Errors keep their `io::ErrorKind` so callers can tell a vanished
    /// process (`NotFound`) from a protected one (`PermissionDenied`).
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Full paths of the entries directly inside `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Passthrough to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}
