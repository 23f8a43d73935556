//! Error types for doccompat
//!
//! Two families live here:
//! - [`BackendError`]: what a target or compat system returned instead of a
//!   result. These are *observations* and get compared structurally.
//! - [`CoreError`]: misuse of the harness itself (bad scenario, unknown
//!   provider). These are never compared, they abort the scenario.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for harness-level operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for calls into a target or compat system
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A server-side command failure.
///
/// `code` and `code_name` are the structural part. `message` is kept for
/// diagnostics only: the two systems are allowed to word errors differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    /// Numeric error code (e.g. 40 for `ConflictingUpdateOperators`)
    pub code: i32,
    /// Symbolic code name
    #[serde(rename = "codeName")]
    pub code_name: String,
    /// Human-readable message
    #[serde(rename = "errmsg")]
    pub message: String,
}

impl CommandError {
    /// Create a command error.
    pub fn new(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            code_name: code_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}: {}", self.code_name, self.code, self.message)
    }
}

/// Failure of a single call against a target or compat collection.
///
/// # Categories
///
/// | Variant | Comes from |
/// |---------|------------|
/// | `Command` | The server rejected the command |
/// | `Transport` | Connection, driver or protocol failure |
/// | `Decode` | A reply could not be decoded into a document |
/// | `Cancelled` | The caller's context was cancelled |
/// | `DeadlineExceeded` | The caller's context timed out |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum BackendError {
    /// Server-side command error
    #[error("command error {0}")]
    Command(CommandError),

    /// Transport or driver failure
    #[error("transport error: {reason}")]
    Transport {
        /// Driver or connection message
        reason: String,
    },

    /// Reply decoding failure
    #[error("decode error: {reason}")]
    Decode {
        /// Why the reply could not be decoded
        reason: String,
    },

    /// Context cancelled before the call completed
    #[error("operation cancelled")]
    Cancelled,

    /// Context deadline elapsed before the call completed
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl BackendError {
    /// Shorthand for a server command error.
    pub fn command(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::Command(CommandError::new(code, code_name, message))
    }

    /// Shorthand for a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        BackendError::Transport {
            reason: reason.into(),
        }
    }

    /// The server command error, if this is one.
    pub fn as_command(&self) -> Option<&CommandError> {
        match self {
            BackendError::Command(c) => Some(c),
            _ => None,
        }
    }

    /// True for cancellation and deadline errors.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, BackendError::Cancelled | BackendError::DeadlineExceeded)
    }
}

impl From<CommandError> for BackendError {
    fn from(e: CommandError) -> Self {
        BackendError::Command(e)
    }
}

/// Errors raised by the harness model itself
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A provider name did not resolve in the registry
    #[error("unknown provider: {name}")]
    UnknownProvider {
        /// Name that was looked up
        name: String,
    },

    /// Two providers registered under one name
    #[error("duplicate provider: {name}")]
    DuplicateProvider {
        /// Name registered twice
        name: String,
    },

    /// Provider name unusable as a collection-name suffix
    #[error("invalid provider name '{name}': {reason}")]
    InvalidProviderName {
        /// Rejected provider name
        name: String,
        /// Why the name is unusable
        reason: String,
    },

    /// A scenario is malformed
    #[error("invalid scenario {scenario}: {reason}")]
    InvalidScenario {
        /// Name of the malformed scenario
        scenario: String,
        /// What is malformed
        reason: String,
    },
}

impl CoreError {
    /// Shorthand for an invalid scenario error.
    pub fn invalid_scenario(scenario: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidScenario {
            scenario: scenario.into(),
            reason: reason.into(),
        }
    }
}
