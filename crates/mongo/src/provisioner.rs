//! Fixture provisioning over two live deployments

use std::sync::Arc;

use bson::Document;
use mongodb::{Client, Database};

use doccompat_core::{collection_name, BackendResult, CollectionPair, FixtureProvisioner, Provider};
use doccompat_harness::{HarnessConfig, HarnessError};

use crate::collection::MongoCollection;
use crate::error::map_error;

/// Creates seeded collection pairs on a target and a compat deployment.
#[derive(Debug, Clone)]
pub struct MongoProvisioner {
    target: Database,
    compat: Database,
}

impl MongoProvisioner {
    /// Connect to both deployments named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Config` when a connection string is missing and
    /// `HarnessError::Setup` when the driver rejects one.
    pub async fn connect(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let target_uri = config
            .target_uri
            .as_deref()
            .ok_or_else(|| HarnessError::config("target_uri is not set"))?;
        let compat_uri = config
            .compat_uri
            .as_deref()
            .ok_or_else(|| HarnessError::config("compat_uri is not set"))?;

        let target = Client::with_uri_str(target_uri)
            .await
            .map_err(|e| HarnessError::setup(format!("target client: {}", e)))?;
        let compat = Client::with_uri_str(compat_uri)
            .await
            .map_err(|e| HarnessError::setup(format!("compat client: {}", e)))?;
        tracing::info!(database = %config.database, "Connected target and compat clients");

        Ok(Self {
            target: target.database(&config.database),
            compat: compat.database(&config.database),
        })
    }

    /// Target database.
    pub fn target(&self) -> &Database {
        &self.target
    }

    /// Compat database.
    pub fn compat(&self) -> &Database {
        &self.compat
    }
}

async fn reseed(database: &Database, name: &str, documents: &[Document]) -> BackendResult<()> {
    let collection = database.collection::<Document>(name);
    collection.drop().await.map_err(map_error)?;
    database.create_collection(name).await.map_err(map_error)?;
    if !documents.is_empty() {
        collection.insert_many(documents).await.map_err(map_error)?;
    }
    Ok(())
}

impl FixtureProvisioner for MongoProvisioner {
    type Collection = MongoCollection;

    async fn provision(
        &self,
        base_name: &str,
        providers: &[Arc<dyn Provider>],
    ) -> BackendResult<Vec<CollectionPair<MongoCollection>>> {
        let mut pairs = Vec::with_capacity(providers.len());
        for provider in providers {
            let name = collection_name(base_name, provider.name());
            let documents = provider.documents();
            tracing::debug!(collection = %name, documents = documents.len(), "Seeding collections");
            let (target, compat) = tokio::join!(
                reseed(&self.target, &name, &documents),
                reseed(&self.compat, &name, &documents),
            );
            target?;
            compat?;
            pairs.push(CollectionPair::new(
                MongoCollection::new(self.target.clone(), name.clone()),
                MongoCollection::new(self.compat.clone(), name),
            ));
        }
        Ok(pairs)
    }
}
