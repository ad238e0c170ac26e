use crate::buildset;
use crate::error::{AccessError, DeleteError};
use crate::policy::{RetentionPolicy, evaluate};
use crate::scanner;
use crate::types::{EntryKind, LogEntry};
use log::{debug, error, info};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    Delete,
    DryRun,
}

#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Entries removed, or that would have been in a dry run.
    pub deleted: Vec<LogEntry>,
    pub failed: Vec<DeleteError>,
    pub retained: usize,
    /// Expired entries kept because their buildset is protected.
    pub protected: usize,
    pub dry_run: bool,
}

impl PurgeReport {
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.deleted.len() + self.failed.len() + self.retained
    }

    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.deleted.iter().map(|e| e.size).sum()
    }
}

fn remove(entry: &LogEntry) -> io::Result<()> {
    match entry.kind {
        EntryKind::File => fs::remove_file(&entry.path),
        EntryKind::JobDir => fs::remove_dir_all(&entry.path),
    }
}

/// Scans `root` and deletes every entry `policy` marks as expired.
/// Only an unusable root is an error; failed deletions end up in the report.
pub fn purge(
    root: &Path,
    policy: &RetentionPolicy,
    mode: PurgeMode,
) -> Result<PurgeReport, AccessError> {
    let scan = scanner::scan(root)?;
    info!(
        "Purging entries older than {} under {}{}",
        policy.cutoff().format("%Y-%m-%d %H:%M:%S"),
        scan.root().display(),
        if mode == PurgeMode::DryRun { " (dry run)" } else { "" }
    );

    let mut report = PurgeReport {
        dry_run: mode == PurgeMode::DryRun,
        ..PurgeReport::default()
    };

    if policy.keeps_latest_successful_buildset() {
        // Protection needs to see every job dir before anything is deleted
        let entries: Vec<LogEntry> = scan.collect();
        let mut policy = policy.clone();
        policy.protect(buildset::latest_successful_buildsets(&entries));
        for entry in entries {
            decide(entry, &policy, mode, &mut report);
        }
    } else {
        for entry in scan {
            decide(entry, policy, mode, &mut report);
        }
    }

    Ok(report)
}

fn decide(
    mut entry: LogEntry,
    policy: &RetentionPolicy,
    mode: PurgeMode,
    report: &mut PurgeReport,
) {
    if !evaluate(&entry, policy) {
        if policy.is_protected(&entry) && entry.modified < policy.cutoff() {
            debug!("{} : protected, keeping", entry.path.display());
            report.protected += 1;
        }
        report.retained += 1;
        return;
    }

    if entry.is_job_dir() {
        entry.size = scanner::dir_size(&entry.path);
    }

    if mode == PurgeMode::DryRun {
        debug!("{} : would remove old logs", entry.path.display());
        report.deleted.push(entry);
        return;
    }

    debug!("{} : removing old logs", entry.path.display());
    match remove(&entry) {
        Ok(()) => report.deleted.push(entry),
        Err(source) => {
            let err = DeleteError {
                path: entry.path,
                source,
            };
            error!("{err}");
            report.failed.push(err);
        }
    }
}
