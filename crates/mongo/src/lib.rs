//! Live backend for doccompat
//!
//! Connects the harness to two MongoDB-protocol deployments through the
//! official driver:
//! - MongoProvisioner: drops, recreates and seeds `<base>_<provider>` on both
//! - MongoCollection / MongoCursor: the backend traits over driver handles
//! - map_error: driver errors onto `BackendError`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collection;
mod error;
mod provisioner;

pub use collection::{MongoCollection, MongoCursor};
pub use error::map_error;
pub use provisioner::MongoProvisioner;
