//! Run reports
//!
//! One [`SubtestReport`] per collection pair, folded into one
//! [`ScenarioReport`] per scenario, folded into a [`RunReport`] per family.

use std::fmt::Write as _;

use doccompat_core::{Expectation, Outcome, Verdict};

use crate::reporter::{ExpectedFailure, Failure, FailureKind, Recording};

/// Result of one provider's sub-test.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtestReport {
    /// Provider name
    pub provider: String,
    /// Generated collection name
    pub collection: String,
    /// First mismatching stage
    pub outcome: Outcome,
    /// Whether the pair counted as non-empty
    pub non_empty: bool,
    /// Tracking reference when the sub-test ran gated
    pub reference: Option<String>,
    /// Hard failures
    pub failures: Vec<Failure>,
    /// Failures tolerated by the gate
    pub expected_failures: Vec<ExpectedFailure>,
    /// Captured diagnostic lines
    pub logs: Vec<String>,
}

impl SubtestReport {
    pub(crate) fn new(
        provider: String,
        collection: String,
        outcome: Outcome,
        non_empty: bool,
        reference: Option<String>,
        recording: Recording,
    ) -> Self {
        Self {
            provider,
            collection,
            outcome,
            non_empty,
            reference,
            failures: recording.failures,
            expected_failures: recording.expected,
            logs: recording.logs,
        }
    }

    /// A sub-test whose task panicked.
    pub(crate) fn panicked(provider: String, collection: String, message: String) -> Self {
        Self {
            provider,
            collection,
            outcome: Outcome::ErrorMismatch,
            non_empty: false,
            reference: None,
            failures: vec![Failure::new(FailureKind::Panicked, message)],
            expected_failures: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// True when the sub-test ran under a known-failure gate.
    pub fn gated(&self) -> bool {
        self.reference.is_some()
    }

    /// True when no hard failure was recorded.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Scenario family (table name)
    pub family: String,
    /// Scenario name
    pub name: String,
    /// Declared expectation
    pub expectation: Expectation,
    /// Classifier verdict
    pub verdict: Verdict,
    /// Setup error that kept sub-tests from running
    pub error: Option<String>,
    /// Sub-tests in provider order
    pub subtests: Vec<SubtestReport>,
}

impl ScenarioReport {
    /// A scenario that could not run.
    pub(crate) fn aborted(
        family: &str,
        name: &str,
        expectation: Expectation,
        error: String,
    ) -> Self {
        Self {
            family: family.to_string(),
            name: name.to_string(),
            expectation,
            verdict: Verdict::Fail {
                reason: error.clone(),
            },
            error: Some(error),
            subtests: Vec::new(),
        }
    }

    /// True when the verdict passed and every sub-test passed.
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && self.verdict.is_pass()
            && self.subtests.iter().all(SubtestReport::passed)
    }

    /// The sub-test for `provider`.
    pub fn subtest(&self, provider: &str) -> Option<&SubtestReport> {
        self.subtests.iter().find(|s| s.provider == provider)
    }

    /// Number of sub-tests that recorded an expected failure.
    pub fn expected_failure_count(&self) -> usize {
        self.subtests
            .iter()
            .filter(|s| !s.expected_failures.is_empty())
            .count()
    }
}

/// Result of one family run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Scenario family (table name)
    pub family: String,
    /// Scenarios sorted by name
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    /// Scenario by name.
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Scenarios that did not pass.
    pub fn failed(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed()).collect()
    }

    /// Number of passing scenarios.
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    /// True when every scenario passed.
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// Human-readable summary, with diagnostics for every failing scenario.
    pub fn summary(&self) -> String {
        let expected: usize = self.scenarios.iter().map(|s| s.expected_failure_count()).sum();
        let mut out = format!(
            "{}: {} scenarios, {} passed, {} failed, {} expected failures\n",
            self.family,
            self.scenarios.len(),
            self.passed_count(),
            self.scenarios.len() - self.passed_count(),
            expected
        );
        for scenario in self.failed() {
            let _ = writeln!(out, "FAIL {}/{}: {}", self.family, scenario.name, scenario.verdict);
            if let Some(error) = &scenario.error {
                let _ = writeln!(out, "  setup: {}", error);
            }
            for subtest in scenario.subtests.iter().filter(|s| !s.passed()) {
                let _ = writeln!(out, "  {} ({})", subtest.provider, subtest.collection);
                for line in &subtest.logs {
                    let _ = writeln!(out, "    log: {}", line);
                }
                for failure in &subtest.failures {
                    let _ = writeln!(out, "    {}", failure);
                }
            }
        }
        out
    }

    /// Panic with [`RunReport::summary`] unless every scenario passed.
    pub fn assert_passed(&self) {
        assert!(self.is_success(), "{}", self.summary());
    }
}
