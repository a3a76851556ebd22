//! Mock process sources for tests and non-Linux hosts.

mod filesystem;
mod scenarios;
mod source;

pub use filesystem::MockFs;
pub use scenarios::stat_line;
pub use source::{Failure, StaticProcess, StaticSource};
