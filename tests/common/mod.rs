//! Shared helpers for the findAndModify suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Once;

use doccompat::findandmodify;
use doccompat::{Context, HarnessConfig, RunReport, ScenarioRunner, ScenarioTable};
use doccompat_memory::MemoryProvisioner;

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Runner over two engines with no behavioural differences.
pub fn memory_runner() -> ScenarioRunner<MemoryProvisioner> {
    init_tracing();
    findandmodify::runner(MemoryProvisioner::identical(), &HarnessConfig::default())
}

/// Run one family with a fresh background context.
pub async fn run_family<P>(
    runner: &ScenarioRunner<P>,
    family: &str,
    table: ScenarioTable,
) -> RunReport
where
    P: doccompat::FixtureProvisioner,
{
    runner.run(&Context::background(), family, table).await
}
