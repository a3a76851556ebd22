//! Sampling loop and its start/stop controller.
//!
//! Two threads matter: the controlling thread, which calls
//! [`Controller::start`] and [`Controller::stop`], and one `sampler` worker
//! that owns process enumeration and every write to the store.

mod cancel;
mod config;
mod controller;
mod worker;

pub use cancel::CancellationToken;
pub use config::{
    ConfigError, DEFAULT_FILENAME, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
    SamplerConfig, parse_interval,
};
pub use controller::Controller;
pub use worker::{SamplingLoop, SharedState, Status};
