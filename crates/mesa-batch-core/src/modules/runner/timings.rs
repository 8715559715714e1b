use crate::domain::{BatchError, BatchResult};
use crate::modules::serialization::ensure_parent_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

pub const TIMINGS_HEADER: [&str; 3] = ["inlist_name", "runtime_seconds", "completion_status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Completed } else { Self::Failed }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub inlist_name: String,
    pub runtime_seconds: f64,
    pub completion_status: RunStatus,
}

fn timings_error(path: &Path, source: impl std::fmt::Display) -> BatchError {
    BatchError::io_system(
        "IO.TIMINGS",
        format!("failed to update timings '{}': {}", path.display(), source),
    )
}

/// Appends one record, writing the header first when the file is new or empty.
pub fn append_timing(path: &Path, record: &TimingRecord) -> BatchResult<()> {
    ensure_parent_dir(path)?;
    let is_new = std::fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| timings_error(path, source))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer
            .write_record(TIMINGS_HEADER)
            .map_err(|source| timings_error(path, source))?;
    }
    writer
        .serialize(record)
        .map_err(|source| timings_error(path, source))?;
    writer.flush().map_err(|source| timings_error(path, source))
}

/// Latest record per inlist name. A missing file reads as empty.
pub fn read_timings(path: &Path) -> BatchResult<BTreeMap<String, TimingRecord>> {
    let mut timings = BTreeMap::new();
    if !path.is_file() {
        return Ok(timings);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| timings_error(path, source))?;
    for (index, result) in reader.deserialize::<TimingRecord>().enumerate() {
        match result {
            Ok(record) => {
                timings.insert(record.inlist_name.clone(), record);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), row = index + 2, "ignoring timing row: {}", error);
            }
        }
    }
    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::{RunStatus, TimingRecord, append_timing, read_timings};
    use std::fs;
    use tempfile::TempDir;

    fn record(name: &str, seconds: f64, status: RunStatus) -> TimingRecord {
        TimingRecord {
            inlist_name: name.to_string(),
            runtime_seconds: seconds,
            completion_status: status,
        }
    }

    #[test]
    fn header_is_written_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("batch_runs/run_timings.csv");
        append_timing(&path, &record("inlist_M1_Z0.02_noovs", 12.5, RunStatus::Completed))
            .expect("first append");
        append_timing(&path, &record("inlist_M2_Z0.02_noovs", 3.0, RunStatus::Failed))
            .expect("second append");

        let text = fs::read_to_string(&path).expect("timings should be readable");
        assert_eq!(
            text,
            "inlist_name,runtime_seconds,completion_status\n\
             inlist_M1_Z0.02_noovs,12.5,completed\n\
             inlist_M2_Z0.02_noovs,3.0,failed\n"
        );
    }

    #[test]
    fn latest_record_wins_and_bad_rows_are_ignored() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run_timings.csv");
        fs::write(
            &path,
            "inlist_name,runtime_seconds,completion_status\n\
             a,10,failed\n\
             b,oops,completed\n\
             a,12,completed\n",
        )
        .expect("timings should be written");

        let timings = read_timings(&path).expect("timings should read");
        assert_eq!(timings.len(), 1);
        assert_eq!(timings["a"].completion_status, RunStatus::Completed);
        assert_eq!(timings["a"].runtime_seconds, 12.0);
    }

    #[test]
    fn missing_file_reads_empty() {
        let temp = TempDir::new().expect("tempdir should be created");
        assert!(read_timings(&temp.path().join("absent.csv")).expect("read").is_empty());
    }
}
