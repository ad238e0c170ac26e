use chrono::{DateTime, Duration, Local};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

pub fn days_ago(days: i64) -> DateTime<Local> {
    Local::now() - Duration::days(days)
}

pub fn mkdir(path: &Path) {
    fs::create_dir_all(path).unwrap();
}

// Sets mtime on files and directories alike; creates missing files.
pub fn touch(path: &Path, when: DateTime<Local>) {
    if !path.exists() {
        File::create(path).unwrap();
    }
    File::open(path)
        .unwrap()
        .set_modified(SystemTime::from(when))
        .unwrap();
}

pub fn write_file(path: &Path, content: &str, when: DateTime<Local>) {
    fs::write(path, content).unwrap();
    touch(path, when);
}

pub fn create_inventory(job_dir: &Path, buildset: &str, project: &str) {
    mkdir(&job_dir.join("zuul-info"));
    let inventory = format!(
        "all:\n  vars:\n    zuul:\n      buildset: {buildset}\n      project:\n        canonical_name: {project}\n"
    );
    fs::write(job_dir.join("zuul-info").join("inventory.yaml"), inventory).unwrap();
}

pub fn create_job_output(job_dir: &Path, failures: u64) {
    let body = format!(r#"[{{"stats": {{"container": {{"failures": {failures}, "ok": 3}}}}}}]"#);
    let file = File::create(job_dir.join("job-output.json.gz")).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

/// Zuul job dir with inventory and job output, mtime set last.
pub fn create_zuul_job(
    job_dir: &Path,
    buildset: &str,
    project: &str,
    failures: u64,
    when: DateTime<Local>,
) {
    mkdir(job_dir);
    create_inventory(job_dir, buildset, project);
    create_job_output(job_dir, failures);
    touch(job_dir, when);
}
