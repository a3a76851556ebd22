//! Process source for the Linux `/proc` filesystem.

pub mod parser;
pub mod process;

pub use process::{ProcfsProcess, ProcfsSource};
