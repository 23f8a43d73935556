//! Seed-data providers and their registry

use bson::Document;
use std::fmt;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::scenario::PROVIDER_SEPARATOR;

/// A named source of seed data.
///
/// Every provider yields one logical dataset, replicated identically into a
/// target and a compat collection.
pub trait Provider: Send + Sync + fmt::Debug {
    /// Stable identity; also the suffix of generated collection names.
    fn name(&self) -> &str;

    /// The seed documents, each with a unique `_id`.
    fn documents(&self) -> Vec<Document>;
}

/// Ordered, name-keyed set of providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, contains the collection-name separator,
    /// or is already registered.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
        let name = provider.name();
        if name.is_empty() {
            return Err(CoreError::InvalidProviderName {
                name: name.to_string(),
                reason: "empty".to_string(),
            });
        }
        if name.contains(PROVIDER_SEPARATOR) {
            return Err(CoreError::InvalidProviderName {
                name: name.to_string(),
                reason: format!("must not contain '{}'", PROVIDER_SEPARATOR),
            });
        }
        if self.get(name).is_some() {
            return Err(CoreError::DuplicateProvider {
                name: name.to_string(),
            });
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Every registered provider, in registration order.
    pub fn all(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Look a provider up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Resolve an explicit list, or every provider when `names` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProvider`] for the first name that does
    /// not resolve.
    pub fn resolve(&self, names: Option<&[String]>) -> Result<Vec<Arc<dyn Provider>>> {
        match names {
            None => Ok(self.providers.clone()),
            Some(names) => names
                .iter()
                .map(|n| {
                    self.get(n)
                        .cloned()
                        .ok_or_else(|| CoreError::UnknownProvider { name: n.clone() })
                })
                .collect(),
        }
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A provider backed by a fixed document list.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    documents: Vec<Document>,
}

impl StaticProvider {
    /// Provider `name` yielding `documents`.
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents,
        }
    }
}

impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn documents(&self) -> Vec<Document> {
        self.documents.clone()
    }
}
