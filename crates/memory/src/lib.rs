//! In-memory document engine for doccompat
//!
//! This crate lets the harness run end to end without any external system:
//! - MemoryEngine: named collections behind a `parking_lot::RwLock`
//! - MemoryCollection / MemoryCursor: the backend `Collection` and
//!   `DocumentCursor` traits
//! - MemoryProvisioner: seeds `<base>_<provider>` on a target and a compat engine
//! - Quirks: deliberate divergences for the target engine
//!
//! Only `findAndModify` is understood. Query, sort and update support cover
//! what scenario self-tests need; it is not a general-purpose database.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod codes;
mod command;
mod engine;
mod provisioner;
mod query;
mod update;

pub use engine::{MemoryCollection, MemoryCursor, MemoryEngine, Quirks};
pub use provisioner::MemoryProvisioner;
