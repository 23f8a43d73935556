//! Scoped cursor release

use bson::{doc, Document};

use doccompat_core::{BackendResult, Collection, DocumentCursor};

use crate::context::Context;

/// Owns a cursor and closes it when dropped.
///
/// Dropping happens on every exit path: normal return, `?`, a context
/// timeout that drops the read future, or a panic unwinding the sub-test.
#[derive(Debug)]
pub struct CursorGuard<C: DocumentCursor> {
    cursor: C,
}

impl<C: DocumentCursor> CursorGuard<C> {
    /// Take ownership of `cursor`.
    pub fn new(cursor: C) -> Self {
        Self { cursor }
    }

    /// Drain the cursor under `ctx`.
    pub async fn collect_all(&mut self, ctx: &Context) -> BackendResult<Vec<Document>> {
        let mut docs = Vec::new();
        while let Some(doc) = ctx.run(self.cursor.next_document()).await? {
            docs.push(doc);
        }
        Ok(docs)
    }
}

impl<C: DocumentCursor> Drop for CursorGuard<C> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

/// Every document of `collection`, ordered by `_id` ascending.
pub async fn find_all<C: Collection>(
    ctx: &Context,
    collection: &C,
) -> BackendResult<Vec<Document>> {
    let cursor = ctx.run(collection.find(doc! {}, doc! { "_id": 1 })).await?;
    let mut guard = CursorGuard::new(cursor);
    guard.collect_all(ctx).await
}
