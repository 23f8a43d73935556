//! Fixture provisioning over a target and a compat engine

use std::sync::Arc;

use doccompat_core::{collection_name, BackendResult, CollectionPair, FixtureProvisioner, Provider};

use crate::engine::{MemoryCollection, MemoryEngine};

/// Seeds identical collections on two engines.
#[derive(Debug, Clone)]
pub struct MemoryProvisioner {
    target: MemoryEngine,
    compat: MemoryEngine,
}

impl MemoryProvisioner {
    /// Provision onto `target` and `compat`.
    pub fn new(target: MemoryEngine, compat: MemoryEngine) -> Self {
        Self { target, compat }
    }

    /// Two reference-behaving engines.
    pub fn identical() -> Self {
        Self::new(MemoryEngine::new("target"), MemoryEngine::new("compat"))
    }

    /// The target engine.
    pub fn target(&self) -> &MemoryEngine {
        &self.target
    }

    /// The compat engine.
    pub fn compat(&self) -> &MemoryEngine {
        &self.compat
    }
}

impl FixtureProvisioner for MemoryProvisioner {
    type Collection = MemoryCollection;

    async fn provision(
        &self,
        base_name: &str,
        providers: &[Arc<dyn Provider>],
    ) -> BackendResult<Vec<CollectionPair<MemoryCollection>>> {
        let mut pairs = Vec::with_capacity(providers.len());
        for provider in providers {
            let name = collection_name(base_name, provider.name());
            let documents = provider.documents();
            tracing::debug!(
                collection = %name,
                documents = documents.len(),
                "Seeding memory collections"
            );
            self.target.reset_collection(&name, documents.clone());
            self.compat.reset_collection(&name, documents);
            pairs.push(CollectionPair::new(
                self.target.collection(name.clone()),
                self.compat.collection(name),
            ));
        }
        Ok(pairs)
    }
}
