use std::io;
use std::path::PathBuf;

/// The log root cannot be used; nothing has been deleted.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("log path dir does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error("log path dir is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read log path dir {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single entry could not be removed. Recorded, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("failed to delete {}: {source}", path.display())]
pub struct DeleteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config line {line} is not KEY=VALUE")]
    Malformed { line: usize },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("retention days must be at least 1")]
    ZeroRetention,
}
