//! Process enumeration and snapshotting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Snapshotter                  │
//! │  timestamp once → read each handle → filter  │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                 ┌──────▼───────┐
//!                 │ProcessSource │ (trait)
//!                 └──────┬───────┘
//!              ┌─────────┴──────────┐
//!       ┌──────▼──────┐      ┌──────▼──────┐
//!       │ ProcfsSource│      │ StaticSource│
//!       │ (FileSystem)│      │  (fixtures) │
//!       └──────┬──────┘      └─────────────┘
//!        ┌─────┴─────┐
//!     RealFs       MockFs
//! ```
//!
//! # Usage
//!
//! ```
//! use psampler_core::collector::{MockFs, ProcfsSource, Snapshotter};
//! use std::time::Duration;
//!
//! let source = ProcfsSource::new(MockFs::typical_system(), "/proc");
//! let snapshotter = Snapshotter::new(source).with_cpu_window(Duration::ZERO);
//! let batch = snapshotter.snapshot(4).unwrap();
//! assert_eq!(batch.len(), 3);
//! ```

pub mod mock;
pub mod procfs;
mod snapshot;
pub mod source;
pub mod traits;

pub use mock::MockFs;
pub use procfs::ProcfsSource;
pub use snapshot::{DEFAULT_CPU_WINDOW, SnapshotError, Snapshotter};
pub use source::{ProcessHandle, ProcessReadError, ProcessSource};
pub use traits::{FileSystem, RealFs};
