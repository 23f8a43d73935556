//! Shared helpers for the harness integration suites.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use bson::Document;
use doccompat_core::{Provider, ProviderRegistry, StaticProvider};
use doccompat_harness::{RunOptions, ScenarioRunner};
use doccompat_memory::{MemoryEngine, MemoryProvisioner, Quirks};

pub const OPERATION: &str = "findAndModify";

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

/// Registry built from `(name, documents)` pairs.
pub fn registry(providers: Vec<(&str, Vec<Document>)>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, documents) in providers {
        let provider: Arc<dyn Provider> = Arc::new(StaticProvider::new(name, documents));
        registry.register(provider).unwrap();
    }
    registry
}

/// Runner over a reference-behaving compat engine and a target with `quirks`.
pub fn runner(quirks: Quirks, registry: ProviderRegistry) -> ScenarioRunner<MemoryProvisioner> {
    runner_with(quirks, Quirks::default(), registry, RunOptions::default())
}

/// Runner with quirks on both sides and explicit options.
pub fn runner_with(
    target: Quirks,
    compat: Quirks,
    registry: ProviderRegistry,
    options: RunOptions,
) -> ScenarioRunner<MemoryProvisioner> {
    init_tracing();
    let provisioner = MemoryProvisioner::new(
        MemoryEngine::with_quirks("target", target),
        MemoryEngine::with_quirks("compat", compat),
    );
    ScenarioRunner::new(provisioner, registry, OPERATION).with_options(options)
}
