//! Sampling configuration and its validation.

use crate::collector::DEFAULT_CPU_WINDOW;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest accepted sampling interval in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Interval upper bound used by the command line front end.
pub const MAX_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_INTERVAL_SECS: u64 = 5;

pub const DEFAULT_FILENAME: &str = "process_data.csv";

/// Reasons `start` refuses to begin collecting.
#[derive(Debug)]
pub enum ConfigError {
    /// Location does not exist or is not a directory.
    InvalidLocation(PathBuf),
    /// Interval is not an integer of at least one second.
    InvalidInterval(String),
    /// Filename is empty or is a path rather than a bare file name.
    InvalidFilename(String),
    /// A collection session is already active.
    AlreadyRunning,
    /// The worker thread could not be spawned.
    Spawn(io::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidLocation(path) => {
                write!(f, "invalid directory path: {}", path.display())
            }
            ConfigError::InvalidInterval(value) => write!(
                f,
                "invalid interval '{}': expected whole seconds, at least {}",
                value, MIN_INTERVAL_SECS
            ),
            ConfigError::InvalidFilename(name) => write!(f, "invalid file name '{}'", name),
            ConfigError::AlreadyRunning => write!(f, "collection is already running"),
            ConfigError::Spawn(e) => write!(f, "failed to start sampling thread: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parses an interval in whole seconds as typed by an operator.
pub fn parse_interval(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs >= MIN_INTERVAL_SECS => Ok(secs),
        _ => Err(ConfigError::InvalidInterval(value.to_string())),
    }
}

/// Settings for one collection session.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval_secs: u64,
    pub filename: String,
    pub location: PathBuf,
    /// Overrides the core count reported by the process source.
    pub core_count: Option<usize>,
    /// CPU measurement window per process.
    pub cpu_window: Duration,
}

impl SamplerConfig {
    pub fn new(interval_secs: u64, filename: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            interval_secs,
            filename: filename.into(),
            location: location.into(),
            core_count: None,
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }

    pub fn with_core_count(mut self, core_count: usize) -> Self {
        self.core_count = Some(core_count);
        self
    }

    pub fn with_cpu_window(mut self, cpu_window: Duration) -> Self {
        self.cpu_window = cpu_window;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Full path of the record store.
    pub fn store_path(&self) -> PathBuf {
        self.location.join(&self.filename)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.location.is_dir() {
            return Err(ConfigError::InvalidLocation(self.location.clone()));
        }
        if self.interval_secs < MIN_INTERVAL_SECS {
            return Err(ConfigError::InvalidInterval(self.interval_secs.to_string()));
        }
        let bare_name = Path::new(&self.filename).file_name();
        if self.filename.trim().is_empty() || bare_name != Some(OsStr::new(&self.filename)) {
            return Err(ConfigError::InvalidFilename(self.filename.clone()));
        }
        Ok(())
    }
}
