//! MemoryEngine: named document collections behind a lock
//!
//! One engine stands in for one database system. Self-tests build two
//! engines (target and compat) and optionally give the target [`Quirks`]
//! so the harness has a real discrepancy to find.
//!
//! # Design Notes
//!
//! - **Insertion order storage**: collections are plain vectors; reads sort
//!   explicitly, nothing relies on storage order
//! - **Open cursor accounting**: every cursor handed out increments a
//!   counter that only `close` decrements. Dropping a cursor without
//!   closing it leaks the count, like a server cursor nobody killed

use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use doccompat_core::{BackendError, BackendResult, Collection, DocumentCursor};

use crate::codes;
use crate::command;
use crate::query;

/// Deliberate divergences from the reference server.
#[derive(Debug, Clone, Default)]
pub struct Quirks {
    /// Documents written by commands store int32 values as int64
    pub widen_int32: bool,
    /// Overlapping update operators are applied in order instead of rejected
    pub skip_conflict_check: bool,
    /// Every command fails with `InternalError`
    pub fail_commands: bool,
    /// Delay before every command reply
    pub command_latency: Option<Duration>,
    /// Delay before every cursor batch
    pub cursor_latency: Option<Duration>,
}

#[derive(Debug)]
struct EngineInner {
    label: String,
    quirks: Quirks,
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
    open_cursors: AtomicUsize,
}

/// An in-memory document database.
///
/// Cloning is cheap and yields a handle to the same engine.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    inner: Arc<EngineInner>,
}

impl MemoryEngine {
    /// Create an engine that behaves like the reference server.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_quirks(label, Quirks::default())
    }

    /// Create an engine with deliberate divergences.
    pub fn with_quirks(label: impl Into<String>, quirks: Quirks) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                label: label.into(),
                quirks,
                collections: RwLock::new(BTreeMap::new()),
                open_cursors: AtomicUsize::new(0),
            }),
        }
    }

    /// Label used in logs ("target", "compat", ...).
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// This engine's quirks.
    pub fn quirks(&self) -> &Quirks {
        &self.inner.quirks
    }

    /// Handle to a collection. The collection need not exist yet.
    pub fn collection(&self, name: impl Into<String>) -> MemoryCollection {
        MemoryCollection {
            name: name.into(),
            engine: self.clone(),
        }
    }

    /// Replace a collection's contents wholesale. Quirks do not apply.
    pub fn reset_collection(&self, name: &str, documents: Vec<Document>) {
        self.inner.collections.write().insert(name.to_string(), documents);
    }

    /// Drop a collection. Returns whether it existed.
    pub fn drop_collection(&self, name: &str) -> bool {
        self.inner.collections.write().remove(name).is_some()
    }

    /// Snapshot of a collection's documents in storage order.
    pub fn documents(&self, name: &str) -> Vec<Document> {
        self.inner
            .collections
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Names of all collections.
    pub fn collection_names(&self) -> Vec<String> {
        self.inner.collections.read().keys().cloned().collect()
    }

    /// Number of cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::SeqCst)
    }

    /// Run `f` with exclusive access to one collection's documents,
    /// creating the collection if needed.
    pub(crate) fn with_collection_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> T {
        let mut collections = self.inner.collections.write();
        f(collections.entry(name.to_string()).or_default())
    }

    fn snapshot_sorted(
        &self,
        name: &str,
        filter: &Document,
        sort: &Document,
    ) -> BackendResult<Vec<Document>> {
        let keys = query::parse_sort(sort)?;
        let collections = self.inner.collections.read();
        let mut docs = Vec::new();
        for doc in collections.get(name).into_iter().flatten() {
            if query::matches(doc, filter)? {
                docs.push(doc.clone());
            }
        }
        drop(collections);
        query::sort_documents(&mut docs, &keys);
        Ok(docs)
    }

    fn open_cursor(&self, docs: Vec<Document>) -> MemoryCursor {
        self.inner.open_cursors.fetch_add(1, Ordering::SeqCst);
        MemoryCursor {
            docs: docs.into(),
            engine: Some(self.clone()),
            latency: self.inner.quirks.cursor_latency,
        }
    }

    fn release_cursor(&self) {
        self.inner.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to one collection of a [`MemoryEngine`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    engine: MemoryEngine,
}

impl MemoryCollection {
    /// The engine this collection belongs to.
    pub fn engine(&self) -> &MemoryEngine {
        &self.engine
    }

    fn dispatch(&self, body: Document) -> BackendResult<Document> {
        if self.engine.quirks().fail_commands {
            return Err(codes::internal_error(format!(
                "{} engine rejects every command",
                self.engine.label()
            )));
        }
        let Some((name, target)) = body.iter().next() else {
            return Err(codes::failed_to_parse("Empty command"));
        };
        if !name.eq_ignore_ascii_case(command::FIND_AND_MODIFY) {
            return Err(codes::command_not_found(name));
        }
        let Bson::String(collection) = target else {
            return Err(codes::type_mismatch(format!(
                "collection name has invalid type {}",
                codes::type_name(target)
            )));
        };
        command::find_and_modify(&self.engine, collection, &body)
    }
}

impl Collection for MemoryCollection {
    type Cursor = MemoryCursor;

    fn name(&self) -> &str {
        &self.name
    }

    async fn run_command(&self, command: Document) -> BackendResult<Document> {
        if let Some(delay) = self.engine.quirks().command_latency {
            tokio::time::sleep(delay).await;
        }
        let reply = self.dispatch(command);
        if let Err(e) = &reply {
            tracing::debug!(
                engine = self.engine.label(),
                collection = %self.name,
                error = %e,
                "Command failed"
            );
        }
        reply
    }

    async fn find(&self, filter: Document, sort: Document) -> BackendResult<MemoryCursor> {
        let docs = self.engine.snapshot_sorted(&self.name, &filter, &sort)?;
        Ok(self.engine.open_cursor(docs))
    }
}

/// Cursor over a snapshot taken when `find` ran.
#[derive(Debug)]
pub struct MemoryCursor {
    docs: VecDeque<Document>,
    engine: Option<MemoryEngine>,
    latency: Option<Duration>,
}

impl MemoryCursor {
    /// Whether `close` has run.
    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }
}

impl DocumentCursor for MemoryCursor {
    async fn next_document(&mut self) -> BackendResult<Option<Document>> {
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }
        if self.is_closed() {
            return Err(BackendError::transport("cursor already closed"));
        }
        Ok(self.docs.pop_front())
    }

    fn close(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.release_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn engine() -> MemoryEngine {
        let e = MemoryEngine::new("test");
        e.reset_collection(
            "c",
            vec![doc! { "_id": "b", "v": 2 }, doc! { "_id": "a", "v": 1 }],
        );
        e
    }

    #[tokio::test]
    async fn test_find_sorts_and_counts_cursors() {
        let e = engine();
        let coll = e.collection("c");
        let mut cursor = coll.find(doc! {}, doc! { "_id": 1 }).await.unwrap();
        assert_eq!(e.open_cursors(), 1);
        let first = cursor.next_document().await.unwrap().unwrap();
        assert_eq!(first.get_str("_id").unwrap(), "a");
        cursor.close();
        cursor.close();
        assert_eq!(e.open_cursors(), 0);
        assert!(cursor.next_document().await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_cursor_stays_open() {
        let e = engine();
        let cursor = e.collection("c").find(doc! {}, doc! { "_id": 1 }).await.unwrap();
        drop(cursor);
        assert_eq!(e.open_cursors(), 1);
    }

    #[tokio::test]
    async fn test_find_on_missing_collection_is_empty() {
        let e = MemoryEngine::new("test");
        let mut cursor = e.collection("nope").find(doc! {}, doc! { "_id": 1 }).await.unwrap();
        assert!(cursor.next_document().await.unwrap().is_none());
        cursor.close();
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let e = engine();
        let err = e.collection("c").run_command(doc! { "frobnicate": "c" }).await.unwrap_err();
        assert_eq!(err.as_command().unwrap().code, 59);
    }

    #[tokio::test]
    async fn test_fail_commands_quirk() {
        let e = MemoryEngine::with_quirks(
            "broken",
            Quirks {
                fail_commands: true,
                ..Quirks::default()
            },
        );
        let err = e
            .collection("c")
            .run_command(doc! { "findAndModify": "c", "remove": true })
            .await
            .unwrap_err();
        assert_eq!(err.as_command().unwrap().code_name, "InternalError");
    }

    #[test]
    fn test_handles_share_state() {
        let e = engine();
        let clone = e.clone();
        clone.drop_collection("c");
        assert!(e.collection_names().is_empty());
    }
}
