pub mod model;
pub mod sink;

pub use model::{Batch, Field, Sample, TIMESTAMP_FORMAT};
pub use sink::{CsvSink, SinkError};
