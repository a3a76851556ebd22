//! psampler-core: per-process resource sampling library.
//!
//! Provides:
//! - `collector`: process enumeration (`/proc` and mock sources) and snapshots
//! - `storage`: sample model and the append-only CSV sink
//! - `sampler`: sampling loop, cancellation and the start/stop controller
//! - `preferences`: persisted "last used location" preference

pub mod collector;
pub mod preferences;
pub mod sampler;
pub mod storage;
