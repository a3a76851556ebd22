//! Append-only CSV record store.
//!
//! The header is written only when the file is created (or found empty). When
//! the file already has a header, that header decides the column order of every
//! row this sink writes. The schema is resolved once and cached.

use crate::storage::model::{Batch, Field};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Error appending to the record store.
#[derive(Debug)]
pub enum SinkError {
    /// Directory creation, open, write or flush failed.
    Io(io::Error),
    /// CSV encoding or header decoding failed.
    Csv(csv::Error),
    /// The existing header is not compatible with the sample fields.
    Schema(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "I/O error: {}", e),
            SinkError::Csv(e) => write!(f, "CSV error: {}", e),
            SinkError::Schema(msg) => write!(f, "schema error: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<io::Error> for SinkError {
    fn from(e: io::Error) -> Self {
        SinkError::Io(e)
    }
}

impl From<csv::Error> for SinkError {
    fn from(e: csv::Error) -> Self {
        SinkError::Csv(e)
    }
}

/// Appends batches to one CSV file.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    schema: Option<Vec<Field>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
        }
    }

    /// Store for `filename` inside the `location` directory.
    pub fn in_dir(location: impl AsRef<Path>, filename: &str) -> Self {
        Self::new(location.as_ref().join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column order in use, once the first non-empty batch has been written.
    pub fn schema(&self) -> Option<&[Field]> {
        self.schema.as_deref()
    }

    /// Appends every sample of `batch` as one row.
    ///
    /// An empty batch is a no-op and never creates the file.
    pub fn append(&mut self, batch: &Batch) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tail = last_byte(&self.path)?;
        let has_header = tail.is_some();
        let schema = self.resolve_schema(has_header)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if tail.is_some_and(|b| b != b'\n') {
            // Previous write was cut short; keep our first row on its own line.
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if !has_header {
            writer.write_record(schema.iter().map(|f| f.column()))?;
        }
        for sample in &batch.samples {
            writer.write_record(schema.iter().map(|f| sample.value(*f)))?;
        }
        writer.flush()?;

        debug!("Appended {} rows to {}", batch.len(), self.path.display());
        Ok(())
    }

    fn resolve_schema(&mut self, has_header: bool) -> Result<Vec<Field>, SinkError> {
        if let Some(schema) = &self.schema {
            return Ok(schema.clone());
        }

        let schema = if has_header {
            self.read_header()?
        } else {
            Field::ALL.to_vec()
        };
        self.schema = Some(schema.clone());
        Ok(schema)
    }

    fn read_header(&self) -> Result<Vec<Field>, SinkError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?;

        let mut schema = Vec::with_capacity(headers.len());
        for column in headers.iter() {
            let field = Field::from_column(column.trim()).ok_or_else(|| {
                SinkError::Schema(format!(
                    "unknown column '{}' in {}",
                    column,
                    self.path.display()
                ))
            })?;
            schema.push(field);
        }

        if schema.is_empty() {
            return Err(SinkError::Schema(format!(
                "empty header in {}",
                self.path.display()
            )));
        }
        Ok(schema)
    }
}

/// Last byte of the file, or `None` when it is missing or empty.
fn last_byte(path: &Path) -> io::Result<Option<u8>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte)?;
    Ok(Some(byte[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::Sample;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    fn ts(second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(10, 0, second, 0)
            .unwrap()
    }

    fn batch(second: u32, names: &[(u32, &str)]) -> Batch {
        let timestamp = ts(second);
        Batch {
            timestamp,
            samples: names
                .iter()
                .map(|(pid, name)| Sample {
                    timestamp,
                    pid: *pid,
                    name: name.to_string(),
                    cpu_usage: 0.25,
                    memory_mb: 12.5,
                })
                .collect(),
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_fresh_store_gets_header_and_rows() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path(), "p.csv");

        sink.append(&batch(0, &[(1, "init"), (2, "bash"), (3, "sshd")]))
            .unwrap();

        let lines = lines(sink.path());
        assert_eq!(lines[0], "timestamp,pid,name,cpu_usage,memory_usage_MB");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "2024-05-01T10:00:00.000000,1,init,0.25,12.5");
        assert_eq!(sink.schema(), Some(&Field::ALL[..]));
    }

    #[test]
    fn test_second_append_does_not_repeat_header() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path(), "p.csv");

        sink.append(&batch(0, &[(1, "init"), (2, "bash")])).unwrap();
        sink.append(&batch(1, &[(1, "init"), (2, "bash"), (3, "vim")]))
            .unwrap();

        let lines = lines(sink.path());
        assert_eq!(lines.len(), 1 + 2 + 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp")).count(), 1);
    }

    #[test]
    fn test_new_sink_on_existing_store_appends_without_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");

        CsvSink::new(&path).append(&batch(0, &[(1, "init")])).unwrap();
        CsvSink::new(&path).append(&batch(1, &[(1, "init")])).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2024-05-01T10:00:01"));
    }

    #[test]
    fn test_empty_batch_never_creates_file() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path().join("nested"), "p.csv");

        sink.append(&Batch::new(ts(0))).unwrap();

        assert!(!sink.path().exists());
        assert!(!dir.path().join("nested").exists());
        assert!(sink.schema().is_none());
    }

    #[test]
    fn test_empty_batch_does_not_append_to_existing_store() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path(), "p.csv");
        sink.append(&batch(0, &[(1, "init")])).unwrap();
        let before = fs::read_to_string(sink.path()).unwrap();

        sink.append(&Batch::new(ts(1))).unwrap();

        assert_eq!(fs::read_to_string(sink.path()).unwrap(), before);
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let location = dir.path().join("a").join("b");
        let mut sink = CsvSink::in_dir(&location, "p.csv");

        sink.append(&batch(0, &[(1, "init")])).unwrap();

        assert!(location.join("p.csv").is_file());
    }

    #[test]
    fn test_existing_header_decides_column_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(&path, "pid,name,timestamp,memory_usage_MB,cpu_usage\n").unwrap();

        let mut sink = CsvSink::new(&path);
        sink.append(&batch(0, &[(7, "vim")])).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "7,vim,2024-05-01T10:00:00.000000,12.5,0.25");
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(&path, "").unwrap();

        CsvSink::new(&path).append(&batch(0, &[(1, "init")])).unwrap();

        let lines = lines(&path);
        assert_eq!(lines[0], "timestamp,pid,name,cpu_usage,memory_usage_MB");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_header_without_newline_is_terminated_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(&path, "timestamp,pid,name,cpu_usage,memory_usage_MB").unwrap();

        CsvSink::new(&path).append(&batch(0, &[(1, "init")])).unwrap();
        // A later session must still read a clean header.
        CsvSink::new(&path).append(&batch(1, &[(1, "init")])).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,pid,name,cpu_usage,memory_usage_MB");
        assert_eq!(lines[1], "2024-05-01T10:00:00.000000,1,init,0.25,12.5");
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_truncated_last_row_does_not_swallow_new_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(
            &path,
            "timestamp,pid,name,cpu_usage,memory_usage_MB\n2024-05-01T09:59:59.000000,9,cu",
        )
        .unwrap();

        CsvSink::new(&path).append(&batch(0, &[(1, "init")])).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2024-05-01T09:59:59.000000,9,cu");
        assert_eq!(lines[2], "2024-05-01T10:00:00.000000,1,init,0.25,12.5");
    }

    #[test]
    fn test_unknown_header_column_is_schema_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(&path, "timestamp,pid,rss\n").unwrap();

        let result = CsvSink::new(&path).append(&batch(0, &[(1, "init")]));

        assert!(matches!(result, Err(SinkError::Schema(_))));
        assert_eq!(lines(&path).len(), 1);
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path(), "p.csv");

        sink.append(&batch(0, &[(5, "Web, Content")])).unwrap();

        let mut reader = csv::Reader::from_path(sink.path()).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "Web, Content");
    }

    #[test]
    fn test_unwritable_location_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let mut sink = CsvSink::in_dir(blocker.join("sub"), "p.csv");
        let result = sink.append(&batch(0, &[(1, "init")]));

        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
