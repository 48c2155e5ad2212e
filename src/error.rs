use crate::model::Metric;
use std::path::PathBuf;
use thiserror::Error;

/// A metric could not be read on this tick. The sampler substitutes 0.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("failed to read {what}: {source}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected format in {what}")]
    Parse { what: String },

    #[error("statvfs on {path} failed: {source}")]
    DiskUsage {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
}

impl MetricError {
    pub fn io(what: impl Into<String>, source: std::io::Error) -> Self {
        MetricError::Io {
            what: what.into(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>) -> Self {
        MetricError::Parse { what: what.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminationError {
    #[error("no such process: {0}")]
    NotFound(i32),

    #[error("permission denied to terminate process {0}")]
    AccessDenied(i32),

    #[error("failed to terminate process {pid}: {detail}")]
    Unknown { pid: i32, detail: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{metric} threshold {value} is not a percentage between 0 and 100")]
    InvalidThreshold { metric: Metric, value: f64 },

    #[error("{metric} threshold {input:?} is not a number")]
    NotANumber { metric: Metric, input: String },

    #[error("history length must be at least 1")]
    EmptyHistory,

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
