//! Core types and traits for doccompat
//!
//! This crate defines the pieces every other crate builds on:
//! - Comparator: type-strict document, sequence and error equality with diffs
//! - Error: `BackendError` (observed failures) and `CoreError` (harness misuse)
//! - Scenario: command template, expectation, provider subset, known failure
//! - Outcome: per-pair outcome and the scenario-level classifier
//! - Provider: seed-data providers and their registry
//! - Backend: `Collection`, `DocumentCursor`, `FixtureProvisioner`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod compare;
pub mod error;
pub mod outcome;
pub mod provider;
pub mod scenario;

pub use backend::{Collection, CollectionPair, DocumentCursor, FixtureProvisioner};
pub use compare::{
    collect_ids, diff_documents, diff_sequences, documents_equal, errors_equal, format_ids,
    sequence_equal, values_equal, Difference, DifferenceKind,
};
pub use error::{BackendError, BackendResult, CommandError, CoreError, Result};
pub use outcome::{classify, Outcome, Verdict};
pub use provider::{Provider, ProviderRegistry, StaticProvider};
pub use scenario::{
    build_command, collection_name, provider_from_collection, table, Expectation, KnownFailure,
    Scenario, ScenarioTable, PROVIDER_SEPARATOR, SORT_FIELD,
};
