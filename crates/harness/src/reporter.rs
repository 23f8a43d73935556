//! Failure sinks and the known-failure gate
//!
//! Sub-tests never panic on a mismatch. They report through a
//! [`FailureReporter`], and the runner picks which one:
//! - [`Recorder`]: standard sink, failures fail the sub-test
//! - [`KnownFailureReporter`]: wraps a recorder and downgrades every failure
//!   to an expected one carrying the tracking reference

use parking_lot::Mutex;
use std::fmt;

use doccompat_core::Scenario;

/// What went wrong inside a sub-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The compat system failed while the target did not
    CompatError,
    /// Errors differ structurally, or only the target failed
    ErrorMismatch,
    /// Both commands succeeded with different responses
    ResponseMismatch,
    /// Post-command collection contents differ
    DocumentsMismatch,
    /// The post-command read failed
    ReadError,
    /// A command failed without a server error (transport or decode)
    Transport,
    /// The context was cancelled or timed out
    Interrupted,
    /// The sub-test panicked
    Panicked,
    /// A gated sub-test observed no failure under the strict policy
    UnexpectedPass,
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Category
    pub kind: FailureKind,
    /// Diagnostic text
    pub message: String,
}

impl Failure {
    /// Create a failure.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// A failure tolerated because the scenario tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedFailure {
    /// The downgraded failure
    pub failure: Failure,
    /// Tracking reference of the known failure
    pub reference: String,
}

/// Where a sub-test sends diagnostics and failures.
pub trait FailureReporter: Send + Sync {
    /// Record a diagnostic line.
    fn log(&self, message: String);

    /// Record a failure.
    fn fail(&self, failure: Failure);
}

/// Everything a [`Recorder`] collected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    /// Diagnostic lines in order
    pub logs: Vec<String>,
    /// Failures that fail the sub-test
    pub failures: Vec<Failure>,
    /// Failures downgraded by a known-failure gate
    pub expected: Vec<ExpectedFailure>,
}

/// Standard failure sink.
#[derive(Debug, Default)]
pub struct Recorder {
    state: Mutex<Recording>,
}

impl Recorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure as expected.
    pub fn expect(&self, failure: Failure, reference: impl Into<String>) {
        self.state.lock().expected.push(ExpectedFailure {
            failure,
            reference: reference.into(),
        });
    }

    /// Number of expected failures so far.
    pub fn expected_count(&self) -> usize {
        self.state.lock().expected.len()
    }

    /// Consume the recorder.
    pub fn finish(self) -> Recording {
        self.state.into_inner()
    }
}

impl FailureReporter for Recorder {
    fn log(&self, message: String) {
        tracing::info!("{}", message);
        self.state.lock().logs.push(message);
    }

    fn fail(&self, failure: Failure) {
        tracing::error!(kind = ?failure.kind, "{}", failure.message);
        self.state.lock().failures.push(failure);
    }
}

/// Reporter for gated sub-tests.
#[derive(Debug)]
pub struct KnownFailureReporter<'a> {
    recorder: &'a Recorder,
    reference: &'a str,
}

impl<'a> KnownFailureReporter<'a> {
    /// Gate `recorder` under `reference`.
    pub fn new(recorder: &'a Recorder, reference: &'a str) -> Self {
        Self { recorder, reference }
    }
}

impl FailureReporter for KnownFailureReporter<'_> {
    fn log(&self, message: String) {
        self.recorder.log(message);
    }

    fn fail(&self, failure: Failure) {
        tracing::warn!(
            reference = %self.reference,
            kind = ?failure.kind,
            "Expected failure: {}",
            failure.message
        );
        self.recorder.expect(failure, self.reference);
    }
}

/// True when failures of `provider` under `scenario` are expected.
///
/// A known failure without a provider list applies to every provider.
pub fn should_gate(scenario: &Scenario, provider: &str) -> bool {
    scenario
        .known_failure()
        .map_or(false, |kf| kf.applies_to(provider))
}
