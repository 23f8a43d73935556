//! Harness error type

use doccompat_core::{BackendError, CoreError};
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that stop the harness before or around a run.
///
/// Observed target/compat failures are not errors here; they become
/// failures in a report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarnessError {
    /// Configuration could not be read or is invalid
    #[error("config error: {reason}")]
    Config {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Connecting to or preparing a backend failed
    #[error("setup failed: {reason}")]
    Setup {
        /// Why the backend could not be prepared
        reason: String,
    },

    /// Scenario or provider misuse
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend call failed outside any scenario
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl HarnessError {
    /// Shorthand for a config error.
    pub fn config(reason: impl Into<String>) -> Self {
        HarnessError::Config {
            reason: reason.into(),
        }
    }

    /// Shorthand for a setup error.
    pub fn setup(reason: impl Into<String>) -> Self {
        HarnessError::Setup {
            reason: reason.into(),
        }
    }
}
