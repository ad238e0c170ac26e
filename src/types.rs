use chrono::{DateTime, Local};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file found outside of any job dir.
    File,
    /// Job output directory, purged as a whole.
    JobDir,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
    /// Bytes on disk. Job dirs stay at 0 until picked for deletion.
    pub size: u64,
    pub kind: EntryKind,
}

impl LogEntry {
    #[must_use]
    pub fn is_job_dir(&self) -> bool {
        self.kind == EntryKind::JobDir
    }
}
