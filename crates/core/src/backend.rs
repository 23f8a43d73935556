//! Traits the harness consumes from a target/compat backend
//!
//! The harness never talks to a database directly. A backend supplies:
//! - [`Collection`]: run a command, open a sorted find cursor
//! - [`DocumentCursor`]: stream documents, release server resources on `close`
//! - [`FixtureProvisioner`]: create seeded target/compat collection pairs
//!
//! Cancellation is applied by the caller: dropping a returned future must
//! abort the call.

use bson::Document;
use std::future::Future;
use std::sync::Arc;

use crate::error::BackendResult;
use crate::provider::Provider;

/// Handle to one collection on one system.
pub trait Collection: Send + Sync + 'static {
    /// Cursor type returned by [`Collection::find`]
    type Cursor: DocumentCursor;

    /// Generated collection name (`<base>_<provider>`).
    fn name(&self) -> &str;

    /// Run a database command and return its reply.
    ///
    /// A reply with `ok: 0` is a [`BackendError::Command`](crate::BackendError::Command).
    fn run_command(
        &self,
        command: Document,
    ) -> impl Future<Output = BackendResult<Document>> + Send;

    /// Open a cursor over documents matching `filter`, ordered by `sort`.
    fn find(
        &self,
        filter: Document,
        sort: Document,
    ) -> impl Future<Output = BackendResult<Self::Cursor>> + Send;
}

/// A server-side cursor.
pub trait DocumentCursor: Send + 'static {
    /// Next document, or `None` when exhausted.
    fn next_document(&mut self) -> impl Future<Output = BackendResult<Option<Document>>> + Send;

    /// Release the cursor. Must be idempotent and must not block.
    fn close(&mut self);
}

/// One target collection and its compat twin, seeded from the same provider.
#[derive(Debug)]
pub struct CollectionPair<C> {
    /// Collection on the system under test
    pub target: Arc<C>,
    /// Collection on the reference system
    pub compat: Arc<C>,
}

impl<C> Clone for CollectionPair<C> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            compat: Arc::clone(&self.compat),
        }
    }
}

impl<C> CollectionPair<C> {
    /// Pair two handles.
    pub fn new(target: C, compat: C) -> Self {
        Self {
            target: Arc::new(target),
            compat: Arc::new(compat),
        }
    }
}

/// Supplies fresh, identically seeded collection pairs.
pub trait FixtureProvisioner: Send + Sync + 'static {
    /// Collection handle type on both systems
    type Collection: Collection;

    /// Create one pair per provider, in provider order.
    ///
    /// Collections are named `<base_name>_<provider>`. All seed data must be
    /// committed and visible on both systems before the future resolves.
    fn provision(
        &self,
        base_name: &str,
        providers: &[Arc<dyn Provider>],
    ) -> impl Future<Output = BackendResult<Vec<CollectionPair<Self::Collection>>>> + Send;
}
