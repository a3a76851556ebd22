//! Sample and batch model written to the record store.

use chrono::NaiveDateTime;

/// Timestamp format used in the store: local ISO-8601 with microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One process observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Tick timestamp, shared by every sample of a batch.
    pub timestamp: NaiveDateTime,
    pub pid: u32,
    pub name: String,
    /// Percent of the whole machine (per-core percent divided by core count).
    /// Not clamped.
    pub cpu_usage: f64,
    /// Resident set size in binary megabytes.
    pub memory_mb: f64,
}

impl Sample {
    /// Converts a resident set size in bytes to binary megabytes.
    pub fn bytes_to_mb(bytes: u64) -> f64 {
        bytes as f64 / BYTES_PER_MB
    }

    /// Renders one field as it appears in the store.
    ///
    /// Floats are written at full precision; nothing is rounded.
    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Timestamp => self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            Field::Pid => self.pid.to_string(),
            Field::Name => self.name.clone(),
            Field::CpuUsage => self.cpu_usage.to_string(),
            Field::MemoryUsageMb => self.memory_mb.to_string(),
        }
    }
}

/// Column of the record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Pid,
    Name,
    CpuUsage,
    MemoryUsageMb,
}

impl Field {
    /// Declaration order; the header of a freshly created store.
    pub const ALL: [Field; 5] = [
        Field::Timestamp,
        Field::Pid,
        Field::Name,
        Field::CpuUsage,
        Field::MemoryUsageMb,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Pid => "pid",
            Field::Name => "name",
            Field::CpuUsage => "cpu_usage",
            Field::MemoryUsageMb => "memory_usage_MB",
        }
    }

    pub fn from_column(column: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column() == column)
    }
}

/// Samples produced by one tick, all sharing `timestamp`.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub timestamp: NaiveDateTime,
    pub samples: Vec<Sample>,
}

impl Batch {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
