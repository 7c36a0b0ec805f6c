//! Error types for netprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. Negative probe results
//! (closed port, silent host) are not errors; they are `ProbeOutcome`s.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a probe request before or while it is set up.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,
}

impl ProbeError {
    /// True when the caller supplied bad input, as opposed to the
    /// environment failing (DNS and the like).
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::Port(_) | Self::InvalidConcurrency => true,
            Self::Target(TargetError::InvalidHost(_)) => true,
            Self::Target(_) => false,
        }
    }
}

/// Result type alias for probe setup.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interrupted")]
    Interrupted,
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(ProbeError::from(PortError::OutOfRange(0)).is_invalid_input());
        assert!(ProbeError::InvalidConcurrency.is_invalid_input());
        assert!(ProbeError::from(TargetError::InvalidHost("x y".into())).is_invalid_input());
        assert!(!ProbeError::from(TargetError::NoAddressesFound("example.com".into()))
            .is_invalid_input());
    }
}
