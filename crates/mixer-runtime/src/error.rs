//! Runtime error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use mixer_core::MixError;

/// Errors that can occur while driving a mixer tree.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Accept or process failed.
    #[error(transparent)]
    Mix(#[from] MixError),

    /// One accept + process run exceeded the configured timeout.
    #[error("routing timed out after {0:?}")]
    TimedOut(Duration),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    /// Returns `true` if the run was cancelled or shut down.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Mix(err) if err.is_cancelled())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
