//! Scenario model
//!
//! A [`Scenario`] is one named differential test case: a command template,
//! an [`Expectation`], an optional provider subset and an optional
//! [`KnownFailure`]. Scenarios are grouped in a [`ScenarioTable`] whose
//! iteration order carries no meaning.

use bson::{doc, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Field a scenario may set to override the default tie-breaking sort
pub const SORT_FIELD: &str = "sort";

/// Separator between the scenario part and the provider part of a collection name
pub const PROVIDER_SEPARATOR: char = '_';

/// Scenario-level contract on the aggregate outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expectation {
    /// At least one collection pair must produce something
    #[default]
    MustProduceResults,
    /// No collection pair may produce anything
    MustProduceNone,
}

/// A confirmed, tracked discrepancy between target and compat.
///
/// `reference` is opaque (an issue URL or ticket id) and only ever shown to
/// humans. An empty `providers` list means the failure applies to every
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownFailure {
    reference: String,
    #[serde(default)]
    providers: Vec<String>,
}

impl KnownFailure {
    /// Known failure for every provider.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            providers: Vec::new(),
        }
    }

    /// Restrict the known failure to the given providers.
    pub fn for_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// The tracking reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Providers the failure is restricted to; empty means all.
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Whether this failure covers `provider`.
    pub fn applies_to(&self, provider: &str) -> bool {
        self.providers.is_empty() || self.providers.iter().any(|p| p == provider)
    }
}

/// One differential test case.
///
/// # Example
///
/// ```
/// use bson::doc;
/// use doccompat_core::{Expectation, Scenario};
///
/// let s = Scenario::new(doc! { "update": { "$set": { "v": 4 }, "$inc": { "v": 4 } } })
///     .expect_none();
/// assert_eq!(s.expectation(), Expectation::MustProduceNone);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    command: Document,
    expectation: Expectation,
    providers: Option<Vec<String>>,
    known_failure: Option<KnownFailure>,
}

impl Scenario {
    /// Scenario sending `command` (without the collection-name field).
    pub fn new(command: Document) -> Self {
        Self {
            command,
            expectation: Expectation::MustProduceResults,
            providers: None,
            known_failure: None,
        }
    }

    /// Require that no collection pair produces anything.
    pub fn expect_none(mut self) -> Self {
        self.expectation = Expectation::MustProduceNone;
        self
    }

    /// Run against these providers instead of every registered one.
    pub fn providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the scenario as a tracked discrepancy for every provider.
    pub fn fails(mut self, reference: impl Into<String>) -> Self {
        self.known_failure = Some(KnownFailure::new(reference));
        self
    }

    /// Mark the scenario as a tracked discrepancy for some providers only.
    pub fn fails_for<I, S>(mut self, reference: impl Into<String>, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_failure = Some(KnownFailure::new(reference).for_providers(providers));
        self
    }

    /// The command template.
    pub fn command(&self) -> &Document {
        &self.command
    }

    /// The declared expectation.
    pub fn expectation(&self) -> Expectation {
        self.expectation
    }

    /// The explicit provider subset, if any.
    pub fn provider_names(&self) -> Option<&[String]> {
        self.providers.as_deref()
    }

    /// The known failure, if any.
    pub fn known_failure(&self) -> Option<&KnownFailure> {
        self.known_failure.as_ref()
    }

    /// Check the scenario is well formed.
    ///
    /// # Errors
    ///
    /// - the known-failure reference is blank
    /// - the command template already names the target collection
    /// - an explicit provider list is empty
    /// - known-failure providers fall outside the explicit provider list
    pub fn validate(&self, name: &str, operation: &str) -> Result<()> {
        if self.command.contains_key(operation) {
            return Err(CoreError::invalid_scenario(
                name,
                format!("command template must not contain the '{}' field", operation),
            ));
        }
        if let Some(providers) = &self.providers {
            if providers.is_empty() {
                return Err(CoreError::invalid_scenario(name, "explicit provider list is empty"));
            }
        }
        if let Some(kf) = &self.known_failure {
            if kf.reference.trim().is_empty() {
                return Err(CoreError::invalid_scenario(name, "known failure reference is empty"));
            }
            if let Some(providers) = &self.providers {
                if let Some(stray) = kf.providers.iter().find(|p| !providers.contains(p)) {
                    return Err(CoreError::invalid_scenario(
                        name,
                        format!(
                            "known failure names provider '{}' the scenario does not run",
                            stray
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Named scenarios; order is irrelevant.
pub type ScenarioTable = BTreeMap<String, Scenario>;

/// Build a [`ScenarioTable`] from `(name, scenario)` pairs.
pub fn table<I, K>(entries: I) -> ScenarioTable
where
    I: IntoIterator<Item = (K, Scenario)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Build the command actually sent to one collection.
///
/// `{<operation>: <collection>}` followed by the template fields, followed by
/// `sort: {_id: 1}` unless the template sets its own sort. Target and compat
/// commands built from the same template differ only in the collection name.
pub fn build_command(operation: &str, collection: &str, template: &Document) -> Document {
    let mut command = Document::new();
    command.insert(operation, collection);
    for (k, v) in template {
        command.insert(k.clone(), v.clone());
    }
    if !template.contains_key(SORT_FIELD) {
        command.insert(SORT_FIELD, doc! { "_id": 1 });
    }
    command
}

/// Collection name for a scenario and provider: `<base>_<provider>`.
pub fn collection_name(base: &str, provider: &str) -> String {
    format!("{}{}{}", base, PROVIDER_SEPARATOR, provider)
}

/// Provider name recovered from a generated collection name (the part after the last `_`).
pub fn provider_from_collection(collection: &str) -> &str {
    collection
        .rsplit_once(PROVIDER_SEPARATOR)
        .map_or(collection, |(_, provider)| provider)
}
