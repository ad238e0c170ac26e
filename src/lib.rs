//! Purge expired CI job logs from a log server directory tree.

pub mod buildset;
pub mod config;
pub mod error;
pub mod policy;
pub mod purge;
pub mod report;
pub mod scanner;
#[cfg(test)]
mod testutil;
pub mod types;
