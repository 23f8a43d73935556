//! doccompat - differential compatibility testing for document databases
//!
//! Runs the same command against the system under test ("target") and a
//! reference deployment ("compat"), then compares replies, errors and the
//! resulting collection contents.
//!
//! # Quick Start
//!
//! ```ignore
//! use doccompat::{findandmodify, Context, HarnessConfig};
//! use doccompat::mongo::MongoProvisioner;
//!
//! let config = HarnessConfig::from_env()?;
//! let provisioner = MongoProvisioner::connect(&config).await?;
//! let runner = findandmodify::runner(provisioner, &config);
//!
//! let report = runner.run(&Context::background(), "Simple", findandmodify::simple()).await;
//! report.assert_passed();
//! ```
//!
//! # Layout
//!
//! The comparator, scenario model and backend traits live in
//! `doccompat-core`; seed data in `doccompat-shareddata`; the runner in
//! `doccompat-harness`. The live driver backend is behind the `live` feature.

pub mod findandmodify;

pub use doccompat_core::{
    build_command, classify, collection_name, table, BackendError, BackendResult, Collection,
    CollectionPair, CommandError, CoreError, DocumentCursor, Expectation, FixtureProvisioner,
    KnownFailure, Outcome, Provider, ProviderRegistry, Scenario, ScenarioTable, StaticProvider,
    Verdict,
};
pub use doccompat_harness::{
    CancelHandle, Context, FailureKind, HarnessConfig, HarnessError, KnownFailurePolicy,
    RunOptions, RunReport, ScenarioReport, ScenarioRunner, SubtestReport, CONFIG_FILE_NAME,
};
pub use doccompat_shareddata as shareddata;

#[cfg(feature = "live")]
pub use doccompat_mongo as mongo;
