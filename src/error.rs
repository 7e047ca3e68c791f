//! Harness errors
//!
//! Faults of the harness itself. Counterexamples are not errors: they are
//! reported through [`crate::verdict::Verdict`].

use crate::runner::ExitOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a stress run
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("generator failed on iteration {iteration} ({outcome}): {stderr}")]
    GeneratorFailed {
        iteration: u64,
        outcome: ExitOutcome,
        stderr: String,
    },

    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scratch I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
