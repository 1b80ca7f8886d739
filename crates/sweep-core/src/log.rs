use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::HarnessError;
use crate::trial::LogRecord;

/// Log file name for a new experiment run, e.g. `20240223_200352.csv`.
pub fn generate_log_id() -> String {
    format!("{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// The append-only experiment log: one row per trial, in execution order.
///
/// Every append opens the file, writes one line, syncs and closes it, so a
/// crash between trials loses at most the in-flight trial and never touches
/// rows already on disk. No buffering is held across trials.
#[derive(Debug, Clone)]
pub struct TrialLog {
    path: PathBuf,
}

impl TrialLog {
    /// Creates the log file empty. An experiment run starts with an existing
    /// zero-row log so an early crash still leaves an identifiable artifact.
    pub fn create(path: impl Into<PathBuf>) -> Result<TrialLog, HarnessError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&path)?;
        file.sync_all()?;
        Ok(TrialLog { path })
    }

    /// Opens an existing log for reading (the `aggregate` postmortem path).
    pub fn open(path: impl Into<PathBuf>) -> TrialLog {
        TrialLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and makes it durable before returning.
    pub fn append(&self, record: &LogRecord) -> Result<(), HarnessError> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        writeln!(file, "{}", record.to_line())?;
        file.sync_all()?;
        Ok(())
    }

    /// Reads the full log back in append order.
    pub fn read(&self) -> Result<Vec<LogRecord>, HarnessError> {
        let data = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for (idx, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(LogRecord::parse_line(line, idx + 1)?);
        }
        Ok(records)
    }
}
