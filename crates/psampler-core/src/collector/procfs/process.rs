//! Process source backed by the `/proc` filesystem.

use crate::collector::procfs::parser::{ProcStat, count_cpus, parse_proc_stat};
use crate::collector::source::{ProcessHandle, ProcessReadError, ProcessSource};
use crate::collector::traits::FileSystem;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock ticks per second (USER_HZ). Standard value for Linux.
const CLK_TCK: u64 = 100;

/// Default page size used to convert `rss` pages to bytes.
const PAGE_SIZE: u64 = 4096;

/// Enumerates processes from `/proc/[pid]/` directories.
pub struct ProcfsSource<F: FileSystem> {
    fs: Arc<F>,
    proc_path: PathBuf,
    page_size: u64,
}

impl<F: FileSystem> Clone for ProcfsSource<F> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            proc_path: self.proc_path.clone(),
            page_size: self.page_size,
        }
    }
}

impl<F: FileSystem> ProcfsSource<F> {
    /// Creates a new procfs source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs: Arc::new(fs),
            proc_path: proc_path.into(),
            page_size: PAGE_SIZE,
        }
    }
}

impl<F: FileSystem> ProcessSource for ProcfsSource<F> {
    type Handle = ProcfsProcess<F>;

    fn processes(&self) -> io::Result<Box<dyn Iterator<Item = ProcfsProcess<F>> + '_>> {
        let entries = self.fs.read_dir(&self.proc_path)?;

        let handles = entries.into_iter().filter_map(move |entry| {
            let pid = entry.file_name()?.to_str()?.parse::<u32>().ok()?;
            Some(ProcfsProcess {
                fs: Arc::clone(&self.fs),
                dir: entry,
                pid,
                page_size: self.page_size,
            })
        });

        Ok(Box::new(handles))
    }

    fn core_count(&self) -> usize {
        let from_stat = self
            .fs
            .read_to_string(&self.proc_path.join("stat"))
            .map(|content| count_cpus(&content))
            .unwrap_or(0);

        if from_stat > 0 {
            from_stat
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Handle to one `/proc/[pid]/` directory.
pub struct ProcfsProcess<F: FileSystem> {
    fs: Arc<F>,
    dir: PathBuf,
    pid: u32,
    page_size: u64,
}

impl<F: FileSystem> ProcfsProcess<F> {
    fn read_file(&self, name: &str) -> Result<String, ProcessReadError> {
        self.fs
            .read_to_string(&self.dir.join(name))
            .map_err(|e| ProcessReadError::from_io(self.pid, &e))
    }

    fn read_stat(&self) -> Result<ProcStat, ProcessReadError> {
        let content = self.read_file("stat")?;
        parse_proc_stat(&content).map_err(|e| ProcessReadError::Other(self.pid, e.message))
    }
}

impl<F: FileSystem> ProcessHandle for ProcfsProcess<F> {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> Result<String, ProcessReadError> {
        match self.read_file("comm") {
            Ok(comm) => Ok(comm.trim().to_string()),
            // comm is missing on some kernels, stat always carries the name
            Err(ProcessReadError::NoSuchProcess(_)) => Ok(self.read_stat()?.comm),
            Err(e) => Err(e),
        }
    }

    fn cpu_percent(&self, window: Duration) -> Result<f64, ProcessReadError> {
        let before = self.read_stat()?.total_ticks();
        let started = Instant::now();
        if !window.is_zero() {
            std::thread::sleep(window);
        }
        let after = self.read_stat()?.total_ticks();
        let elapsed = started.elapsed().as_secs_f64();

        if elapsed <= 0.0 {
            return Ok(0.0);
        }
        let cpu_seconds = after.saturating_sub(before) as f64 / CLK_TCK as f64;
        Ok(cpu_seconds / elapsed * 100.0)
    }

    fn resident_memory_bytes(&self) -> Result<u64, ProcessReadError> {
        let stat = self.read_stat()?;
        if stat.state == 'Z' {
            return Err(ProcessReadError::Zombie(self.pid));
        }
        Ok(stat.rss.max(0) as u64 * self.page_size)
    }
}
