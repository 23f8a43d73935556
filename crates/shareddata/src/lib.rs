//! Shared seed data for doccompat scenarios
//!
//! Each provider is a fixed, named dataset. Scenarios refer to providers by
//! the name constants below; [`registry()`] holds all of them.
//!
//! | Provider | Contents |
//! |----------|----------|
//! | `Scalars` | One document per scalar BSON type |
//! | `Doubles`, `SmallDoubles` | Doubles incl. zero, -0, NaN, extremes |
//! | `Int32s`, `Int64s` | Integers incl. zero and extremes |
//! | `Strings`, `Bools`, `Nulls`, `Unsets` | Single-type sets; `Unsets` has no `v` |
//! | `ObjectIDs`, `DateTimes`, `Timestamps`, `Binaries`, `Regexes` | Special scalars |
//! | `ArrayDocuments`, `ArrayAndDocuments`, `Composites` | Nested arrays and documents |
//! | `Mixed` | One field, a different type per document |

#![warn(missing_docs)]

mod composites;
mod scalars;

use bson::Document;
use doccompat_core::{ProviderRegistry, StaticProvider};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// One document per scalar BSON type
pub const SCALARS: &str = "Scalars";
/// Doubles including edge values
pub const DOUBLES: &str = "Doubles";
/// Doubles that fit comfortably in any numeric representation
pub const SMALL_DOUBLES: &str = "SmallDoubles";
/// 32-bit integers
pub const INT32S: &str = "Int32s";
/// 64-bit integers
pub const INT64S: &str = "Int64s";
/// Strings
pub const STRINGS: &str = "Strings";
/// Booleans
pub const BOOLS: &str = "Bools";
/// Nulls
pub const NULLS: &str = "Nulls";
/// Documents without a `v` field
pub const UNSETS: &str = "Unsets";
/// Object ids
pub const OBJECT_IDS: &str = "ObjectIDs";
/// Dates
pub const DATE_TIMES: &str = "DateTimes";
/// Internal timestamps
pub const TIMESTAMPS: &str = "Timestamps";
/// Binary data
pub const BINARIES: &str = "Binaries";
/// Regular expressions
pub const REGEXES: &str = "Regexes";
/// Arrays of documents
pub const ARRAY_DOCUMENTS: &str = "ArrayDocuments";
/// Arrays of multi-field documents next to plain documents
pub const ARRAY_AND_DOCUMENTS: &str = "ArrayAndDocuments";
/// Nested arrays and documents
pub const COMPOSITES: &str = "Composites";
/// Mixed types under one field
pub const MIXED: &str = "Mixed";

const CATALOGUE: &[(&str, fn() -> Vec<Document>)] = &[
    (SCALARS, scalars::scalars),
    (DOUBLES, scalars::doubles),
    (SMALL_DOUBLES, scalars::small_doubles),
    (INT32S, scalars::int32s),
    (INT64S, scalars::int64s),
    (STRINGS, scalars::strings),
    (BOOLS, scalars::bools),
    (NULLS, scalars::nulls),
    (UNSETS, scalars::unsets),
    (OBJECT_IDS, scalars::object_ids),
    (DATE_TIMES, scalars::date_times),
    (TIMESTAMPS, scalars::timestamps),
    (BINARIES, scalars::binaries),
    (REGEXES, scalars::regexes),
    (ARRAY_DOCUMENTS, composites::array_documents),
    (ARRAY_AND_DOCUMENTS, composites::array_and_documents),
    (COMPOSITES, composites::composites),
    (MIXED, composites::mixed),
];

static REGISTRY: Lazy<ProviderRegistry> = Lazy::new(build_registry);

fn build_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, documents) in CATALOGUE {
        if let Err(e) = registry.register(Arc::new(StaticProvider::new(*name, documents()))) {
            tracing::error!(provider = name, error = %e, "Skipping provider");
        }
    }
    tracing::debug!(providers = registry.len(), "Built shared data registry");
    registry
}

/// The process-wide provider registry.
pub fn registry() -> &'static ProviderRegistry {
    &REGISTRY
}

/// Every provider name except those listed.
///
/// Convenient for known failures that hit all providers but a few.
pub fn all_except(excluded: &[&str]) -> Vec<String> {
    CATALOGUE
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !excluded.contains(name))
        .map(str::to_string)
        .collect()
}
