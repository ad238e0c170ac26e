use crate::error::AccessError;
use crate::types::{EntryKind, LogEntry};
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

// Zuul writes zuul-info/, Jenkins jobs with ARA write ara-database/
const JOB_DIR_SUBDIRS: [&str; 2] = ["zuul-info", "ara-database"];
const JENKINS_CONSOLE: &str = "consoleText.txt";

/// Directory listing with symlinks left out.
#[derive(Debug, Default)]
pub struct DirContent {
    pub dirs: HashSet<String>,
    pub files: HashSet<String>,
}

impl DirContent {
    #[must_use]
    pub fn is_job_dir(&self) -> bool {
        let is_zuul_or_ara = JOB_DIR_SUBDIRS.iter().any(|d| self.dirs.contains(*d));
        let is_jenkins_console = self.files.contains(JENKINS_CONSOLE);
        let is_empty = self.dirs.is_empty() && self.files.is_empty();

        is_zuul_or_ara || is_jenkins_console || is_empty
    }
}

pub fn list_dir(path: &Path) -> io::Result<DirContent> {
    let mut content = DirContent::default();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        // DirEntry::file_type does not follow symlinks
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if file_type.is_dir() {
            content.dirs.insert(name);
        } else {
            content.files.insert(name);
        }
    }
    Ok(content)
}

pub fn is_job_dir(path: &Path) -> io::Result<bool> {
    Ok(list_dir(path)?.is_job_dir())
}

/// Apparent size of all regular files below `path`.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Resolves the log root and makes sure it can be listed.
pub fn check_root(root: &Path) -> Result<PathBuf, AccessError> {
    let resolved = match fs::canonicalize(root) {
        Ok(p) => p,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AccessError::Missing(root.to_path_buf()));
        }
        Err(source) => {
            return Err(AccessError::Unreadable {
                path: root.to_path_buf(),
                source,
            });
        }
    };

    if !resolved.is_dir() {
        return Err(AccessError::NotADirectory(resolved));
    }

    fs::read_dir(&resolved).map_err(|source| AccessError::Unreadable {
        path: resolved.clone(),
        source,
    })?;

    Ok(resolved)
}

/// Lazily walks a log tree, yielding job dirs whole and loose files
/// found outside of them. Consumed by iteration; scan again to restart.
pub struct Scan {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

pub fn scan(root: &Path) -> Result<Scan, AccessError> {
    let root = check_root(root)?;
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();
    Ok(Scan { root, walker })
}

impl Scan {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn handle_dir(&mut self, entry: &DirEntry) -> Option<LogEntry> {
        let job_dir = match is_job_dir(entry.path()) {
            Ok(j) => j,
            Err(e) => {
                warn!("{} : cannot list directory, skipping: {e}", entry.path().display());
                self.walker.skip_current_dir();
                return None;
            }
        };

        if !job_dir {
            debug!("{} : walking", entry.path().display());
            return None;
        }

        self.walker.skip_current_dir();
        if entry.depth() == 0 {
            // The root is never a candidate, and job dir contents are never
            // purged file by file.
            debug!("{} : root is a job dir, nothing to scan", entry.path().display());
            return None;
        }

        debug!("{} : is a job dir", entry.path().display());
        let (_, modified) = stat(entry)?;
        // Sized only once chosen for deletion, see purge::decide
        Some(LogEntry {
            path: entry.path().to_path_buf(),
            modified,
            size: 0,
            kind: EntryKind::JobDir,
        })
    }

    fn handle_file(entry: &DirEntry) -> Option<LogEntry> {
        let (size, modified) = stat(entry)?;
        Some(LogEntry {
            path: entry.path().to_path_buf(),
            modified,
            size,
            kind: EntryKind::File,
        })
    }
}

// Entries without a readable mtime are skipped, never treated as expired.
fn stat(entry: &DirEntry) -> Option<(u64, DateTime<Local>)> {
    let stat = entry
        .metadata()
        .map_err(io::Error::from)
        .and_then(|m| Ok((m.len(), m.modified()?)));
    match stat {
        Ok((len, modified)) => Some((len, modified.into())),
        Err(e) => {
            warn!("{} : cannot read metadata, skipping: {e}", entry.path().display());
            None
        }
    }
}

impl Iterator for Scan {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        loop {
            let entry = match self.walker.next()? {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable path: {e}");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                continue;
            }

            let found = if file_type.is_dir() {
                self.handle_dir(&entry)
            } else if file_type.is_file() {
                Self::handle_file(&entry)
            } else {
                None
            };

            if found.is_some() {
                return found;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{days_ago, mkdir, touch, write_file};
    use tempfile::TempDir;

    fn names(root: &Path) -> Vec<(String, EntryKind)> {
        scan(root)
            .unwrap()
            .map(|e| {
                let rel = e.path.strip_prefix(fs::canonicalize(root).unwrap()).unwrap();
                (rel.to_string_lossy().to_string(), e.kind)
            })
            .collect()
    }

    #[test]
    fn test_missing_root_is_access_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(scan(&missing), Err(AccessError::Missing(_))));
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.log");
        fs::write(&file, "x").unwrap();
        assert!(matches!(scan(&file), Err(AccessError::NotADirectory(_))));
    }

    #[test]
    fn test_unreadable_root_is_access_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.log");
        fs::write(&file, "x").unwrap();
        // Resolving a path through a regular file fails with ENOTDIR
        let through_file = file.join("logs");
        assert!(matches!(
            scan(&through_file),
            Err(AccessError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_vanished_subdir_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(&root.join("a.log"), "x", days_ago(1));
        mkdir(&root.join("b-dir").join("nested"));
        write_file(&root.join("c.log"), "x", days_ago(1));

        let mut scan = scan(root).unwrap();
        let first = scan.next().unwrap();
        assert!(first.path.ends_with("a.log"));

        // The root listing is already buffered, b-dir still gets visited
        fs::remove_dir_all(root.join("b-dir")).unwrap();
        let rest: Vec<_> = scan.collect();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].path.ends_with("c.log"));
    }

    #[test]
    fn test_is_job_dir_path() {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");
        mkdir(&job.join("zuul-info"));
        let plain = tmp.path().join("plain");
        mkdir(&plain);
        fs::write(plain.join("notes.txt"), "x").unwrap();

        assert!(is_job_dir(&job).unwrap());
        assert!(!is_job_dir(&plain).unwrap());
        assert!(is_job_dir(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(names(tmp.path()).is_empty());
    }

    #[test]
    fn test_root_job_dir_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        mkdir(&tmp.path().join("zuul-info"));
        fs::write(tmp.path().join("job-output.txt"), "x").unwrap();
        assert!(names(tmp.path()).is_empty());
    }

    #[test]
    fn test_job_dir_markers() {
        let mut content = DirContent::default();
        assert!(content.is_job_dir(), "empty dir is a job dir");

        content.files.insert("job-output.txt".to_string());
        assert!(!content.is_job_dir());

        content.dirs.insert("zuul-info".to_string());
        assert!(content.is_job_dir());

        let mut jenkins = DirContent::default();
        jenkins.dirs.insert("ara-database".to_string());
        assert!(jenkins.is_job_dir());

        let mut console = DirContent::default();
        console.files.insert("consoleText.txt".to_string());
        assert!(console.is_job_dir());
    }

    #[test]
    fn test_job_dirs_yielded_whole_and_files_listed() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(&root.join("a.log"), "aaaa", days_ago(31));
        mkdir(&root.join("parent").join("job").join("zuul-info"));
        write_file(&root.join("parent").join("job").join("job-output.txt"), "123456", days_ago(40));
        mkdir(&root.join("parent").join("other"));
        write_file(&root.join("parent").join("other").join("consoleText.txt"), "c", days_ago(1));

        let found = names(root);
        assert_eq!(
            found,
            vec![
                ("a.log".to_string(), EntryKind::File),
                ("parent/job".to_string(), EntryKind::JobDir),
                ("parent/other".to_string(), EntryKind::JobDir),
            ]
        );
    }

    #[test]
    fn test_job_dir_size_and_mtime() {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");
        mkdir(&job.join("zuul-info"));
        fs::write(job.join("zuul-info").join("inventory.yaml"), "1234").unwrap();
        fs::write(job.join("job-output.txt"), "123456").unwrap();
        let when = days_ago(45);
        touch(&job, when);

        let entries: Vec<_> = scan(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 0, "job dirs are not walked during the scan");
        assert_eq!(entries[0].modified.timestamp(), when.timestamp());
        assert_eq!(dir_size(&job), 10);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let real = root.join("real");
        mkdir(&real);
        std::os::unix::fs::symlink(&real, root.join("link")).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("dangling")).unwrap();

        let found = names(root);
        assert_eq!(found, vec![("real".to_string(), EntryKind::JobDir)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_with_only_symlinks_is_empty() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target.log");
        fs::write(&target, "x").unwrap();
        let dir = tmp.path().join("links");
        mkdir(&dir);
        std::os::unix::fs::symlink(&target, dir.join("t.log")).unwrap();

        assert!(is_job_dir(&dir).unwrap());
    }
}
