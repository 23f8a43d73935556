//! Per-pair outcomes and the scenario-level classifier

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scenario::Expectation;

/// What a single collection pair observed.
///
/// When several stages mismatch, the earliest stage wins: command response
/// or error first, then the post-read document set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Both commands succeeded with different responses
    ResponseMismatch,
    /// The commands failed differently, or only one failed
    ErrorMismatch,
    /// The collections differ after the command
    DocumentsMismatch,
    /// Target and compat agree
    Match,
}

impl Outcome {
    /// True for [`Outcome::Match`].
    pub fn is_match(self) -> bool {
        self == Outcome::Match
    }

    /// Keep the first mismatch seen.
    pub fn or(self, later: Outcome) -> Outcome {
        if self.is_match() {
            later
        } else {
            self
        }
    }
}

/// Scenario-level verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The scenario met its expectation
    Pass,
    /// The scenario violated its expectation
    Fail {
        /// Why
        reason: String,
    },
}

impl Verdict {
    /// True for [`Verdict::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail { reason } => write!(f, "fail: {}", reason),
        }
    }
}

/// Fold per-pair non-emptiness into the scenario verdict.
///
/// - `MustProduceResults` passes when any pair was non-empty, or
///   unconditionally when the scenario declares a known failure.
/// - `MustProduceNone` passes only when every pair was empty. Known
///   failures never excuse it.
pub fn classify(
    expectation: Expectation,
    per_collection_non_empty: &[bool],
    known_failure: bool,
) -> Verdict {
    let non_empty = per_collection_non_empty.iter().any(|&b| b);
    match expectation {
        Expectation::MustProduceResults => {
            if non_empty || known_failure {
                Verdict::Pass
            } else {
                Verdict::Fail {
                    reason: "expected non-empty results".to_string(),
                }
            }
        }
        Expectation::MustProduceNone => {
            if non_empty {
                Verdict::Fail {
                    reason: "expected empty results".to_string(),
                }
            } else {
                Verdict::Pass
            }
        }
    }
}
