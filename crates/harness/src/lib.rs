//! Differential test harness for doccompat
//!
//! Drives scenario tables against a target and a compat system:
//! - ScenarioRunner: provisions collection pairs and fans out sub-tests
//! - DualExecutor: runs one command on both collections and compares
//!   responses, errors and post-command contents
//! - FailureReporter / KnownFailureReporter: failure sinks and the
//!   known-failure gate
//! - Context: cancellation and deadlines for every backend call
//! - HarnessConfig: `doccompat.toml` and environment overrides
//!
//! ```text
//! let runner = ScenarioRunner::new(provisioner, registry, "findAndModify");
//! let report = runner.run(&Context::background(), "Remove", table).await;
//! report.assert_passed();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod report;
pub mod reporter;
pub mod runner;

pub use config::{HarnessConfig, KnownFailurePolicy, CONFIG_FILE_NAME};
pub use context::{CancelHandle, Context};
pub use cursor::{find_all, CursorGuard};
pub use error::{HarnessError, Result};
pub use executor::{response_non_empty, DualExecutor, Execution};
pub use report::{RunReport, ScenarioReport, SubtestReport};
pub use reporter::{
    should_gate, ExpectedFailure, Failure, FailureKind, FailureReporter, KnownFailureReporter,
    Recorder, Recording,
};
pub use runner::{RunOptions, ScenarioRunner};
