use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOG_PATH_DIR: &str = "/var/www/logs";
pub const DEFAULT_RETENTION_DAYS: u32 = 31;

/// Everything one purge run needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_path_dir: PathBuf,
    pub retention_days: u32,
    pub dry_run: bool,
    pub debug: bool,
    pub loop_interval: Option<Duration>,
    pub build_success: bool,
}

/// Partial settings from one source. `None` means "not given here".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub log_path_dir: Option<PathBuf>,
    pub retention_days: Option<u32>,
    pub dry_run: Option<bool>,
    pub debug: Option<bool>,
    pub loop_seconds: Option<u64>,
    pub build_success: Option<bool>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Overrides {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses `KEY=VALUE` lines; blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut overrides = Self::default();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else {
                return Err(ConfigError::Malformed { line: idx + 1 });
            };
            let key = k.trim();
            let val = v.trim().trim_matches('"');

            match key {
                "LOG_PATH_DIR" => overrides.log_path_dir = Some(PathBuf::from(val)),
                "RETENTION_DAYS" => {
                    overrides.retention_days = Some(val.parse().map_err(|_| invalid(key, val))?);
                }
                "LOOP_SECONDS" => {
                    overrides.loop_seconds = Some(val.parse().map_err(|_| invalid(key, val))?);
                }
                "DRY_RUN" => overrides.dry_run = Some(parse_bool(key, val)?),
                "DEBUG" => overrides.debug = Some(parse_bool(key, val)?),
                "BUILD_SUCCESS" => overrides.build_success = Some(parse_bool(key, val)?),
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }

        Ok(overrides)
    }

    /// Fields set in `self` win over `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            log_path_dir: self.log_path_dir.or(fallback.log_path_dir),
            retention_days: self.retention_days.or(fallback.retention_days),
            dry_run: self.dry_run.or(fallback.dry_run),
            debug: self.debug.or(fallback.debug),
            loop_seconds: self.loop_seconds.or(fallback.loop_seconds),
            build_success: self.build_success.or(fallback.build_success),
        }
    }
}

impl Settings {
    /// Command line beats config file beats built-in defaults.
    pub fn resolve(cli: Overrides, file: Option<Overrides>) -> Result<Self, ConfigError> {
        let merged = cli.or(file.unwrap_or_default());

        let retention_days = merged.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS);
        if retention_days == 0 {
            return Err(ConfigError::ZeroRetention);
        }

        Ok(Self {
            log_path_dir: merged
                .log_path_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH_DIR)),
            retention_days,
            dry_run: merged.dry_run.unwrap_or(false),
            debug: merged.debug.unwrap_or(false),
            // 0 disables looping, same as leaving it out
            loop_interval: merged
                .loop_seconds
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            build_success: merged.build_success.unwrap_or(false),
        })
    }
}
