use crate::types::LogEntry;
use chrono::{DateTime, Local};
use flate2::read::GzDecoder;
use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const INVENTORY: &str = "zuul-info/inventory.yaml";
const JOB_OUTPUT: &str = "job-output.json.gz";

// Only the keys we need out of all.vars.zuul
#[derive(Debug, Deserialize)]
struct Inventory {
    all: InventoryGroup,
}

#[derive(Debug, Deserialize)]
struct InventoryGroup {
    vars: InventoryVars,
}

#[derive(Debug, Deserialize)]
struct InventoryVars {
    zuul: ZuulVars,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZuulVars {
    #[serde(deserialize_with = "scalar_string")]
    pub buildset: String,
    pub project: ZuulProject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZuulProject {
    #[serde(deserialize_with = "scalar_string")]
    pub canonical_name: String,
}

// Unquoted values such as `buildset: 12345` load as YAML numbers
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, got {other:?}"))),
    }
}

#[derive(Debug, Deserialize)]
struct Playbook {
    #[serde(default)]
    stats: HashMap<String, HostStats>,
}

#[derive(Debug, Deserialize)]
struct HostStats {
    #[serde(default)]
    failures: u64,
    #[serde(default)]
    unreachable: u64,
}

#[must_use]
pub fn read_inventory(job_dir: &Path) -> Option<ZuulVars> {
    let path = job_dir.join(INVENTORY);
    let content = fs::read_to_string(&path).ok()?;
    match serde_yaml::from_str::<Inventory>(&content) {
        Ok(inventory) => Some(inventory.all.vars.zuul),
        Err(e) => {
            debug!("{} : unusable inventory: {e}", path.display());
            None
        }
    }
}

#[must_use]
pub fn extract_buildset(job_dir: &Path) -> Option<String> {
    read_inventory(job_dir).map(|zuul| zuul.buildset)
}

#[must_use]
pub fn extract_project_canonical_name(job_dir: &Path) -> Option<String> {
    read_inventory(job_dir).map(|zuul| zuul.project.canonical_name)
}

/// A job succeeded when every host of every playbook in its
/// job-output.json.gz reports no failures and no unreachable state.
#[must_use]
pub fn check_job_success(job_dir: &Path) -> bool {
    let path = job_dir.join(JOB_OUTPUT);
    let Ok(file) = File::open(&path) else {
        return false;
    };

    let playbooks: Vec<Playbook> = match serde_json::from_reader(GzDecoder::new(file)) {
        Ok(p) => p,
        Err(e) => {
            debug!("{} : unusable job output: {e}", path.display());
            return false;
        }
    };

    !playbooks.is_empty()
        && playbooks
            .iter()
            .flat_map(|p| p.stats.values())
            .all(|host| host.failures == 0 && host.unreachable == 0)
}

#[derive(Debug)]
struct BuildsetState {
    jobs: Vec<PathBuf>,
    succeeded: bool,
    newest: DateTime<Local>,
}

/// Job dirs of the newest fully successful buildset of each project.
#[must_use]
pub fn latest_successful_buildsets(entries: &[LogEntry]) -> HashSet<PathBuf> {
    let mut buildsets: HashMap<(String, String), BuildsetState> = HashMap::new();

    for entry in entries.iter().filter(|e| e.is_job_dir()) {
        let Some(zuul) = read_inventory(&entry.path) else {
            continue;
        };
        let succeeded = check_job_success(&entry.path);

        let state = buildsets
            .entry((zuul.project.canonical_name, zuul.buildset))
            .or_insert_with(|| BuildsetState {
                jobs: Vec::new(),
                succeeded: true,
                newest: entry.modified,
            });
        state.jobs.push(entry.path.clone());
        state.succeeded &= succeeded;
        state.newest = state.newest.max(entry.modified);
    }

    let mut latest: HashMap<String, (String, BuildsetState)> = HashMap::new();
    for ((project, buildset), state) in buildsets {
        if !state.succeeded {
            continue;
        }
        // Ties on mtime go to the greater buildset id so repeated runs agree
        match latest.get(&project) {
            Some((current_id, current))
                if (current.newest, current_id.as_str()) >= (state.newest, buildset.as_str()) => {}
            _ => {
                latest.insert(project, (buildset, state));
            }
        }
    }

    latest
        .into_iter()
        .flat_map(|(project, (buildset, state))| {
            debug!(
                "{project} : protecting buildset {buildset} ({} jobs)",
                state.jobs.len()
            );
            state.jobs
        })
        .collect()
}
