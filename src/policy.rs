use crate::types::LogEntry;
use chrono::{DateTime, Duration, Local};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    cutoff: DateTime<Local>,
    keep_latest_successful_buildset: bool,
    protected: HashSet<PathBuf>,
}

impl RetentionPolicy {
    /// Entries last modified more than `days` days before `now` expire.
    #[must_use]
    pub fn older_than_days(days: u32, now: DateTime<Local>) -> Self {
        Self::with_cutoff(now - Duration::days(i64::from(days)))
    }

    #[must_use]
    pub fn with_cutoff(cutoff: DateTime<Local>) -> Self {
        Self {
            cutoff,
            keep_latest_successful_buildset: false,
            protected: HashSet::new(),
        }
    }

    #[must_use]
    pub fn keep_latest_successful_buildset(mut self, enabled: bool) -> Self {
        self.keep_latest_successful_buildset = enabled;
        self
    }

    pub fn protect<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.protected.extend(paths);
    }

    #[must_use]
    pub fn cutoff(&self) -> DateTime<Local> {
        self.cutoff
    }

    #[must_use]
    pub fn keeps_latest_successful_buildset(&self) -> bool {
        self.keep_latest_successful_buildset
    }

    #[must_use]
    pub fn is_protected(&self, entry: &LogEntry) -> bool {
        self.protected.contains(&entry.path)
    }
}

/// True when `entry` should be deleted under `policy`.
#[must_use]
pub fn evaluate(entry: &LogEntry, policy: &RetentionPolicy) -> bool {
    entry.modified < policy.cutoff && !policy.is_protected(entry)
}
