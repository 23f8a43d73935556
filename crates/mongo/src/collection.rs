//! Collection and cursor handles over the official driver

use bson::Document;
use mongodb::{Cursor, Database};

use doccompat_core::{BackendResult, Collection, DocumentCursor};

use crate::error::map_error;

/// One collection on one deployment.
#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    database: Database,
    inner: mongodb::Collection<Document>,
}

impl MongoCollection {
    pub(crate) fn new(database: Database, name: String) -> Self {
        let inner = database.collection::<Document>(&name);
        Self { name, database, inner }
    }

    /// The owning database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl Collection for MongoCollection {
    type Cursor = MongoCursor;

    fn name(&self) -> &str {
        &self.name
    }

    async fn run_command(&self, command: Document) -> BackendResult<Document> {
        self.database.run_command(command).await.map_err(map_error)
    }

    async fn find(&self, filter: Document, sort: Document) -> BackendResult<MongoCursor> {
        let cursor = self.inner.find(filter).sort(sort).await.map_err(map_error)?;
        Ok(MongoCursor { inner: Some(cursor) })
    }
}

/// Server-side cursor. Dropping the driver cursor kills it on the server.
#[derive(Debug)]
pub struct MongoCursor {
    inner: Option<Cursor<Document>>,
}

impl DocumentCursor for MongoCursor {
    async fn next_document(&mut self) -> BackendResult<Option<Document>> {
        let Some(cursor) = self.inner.as_mut() else {
            return Err(doccompat_core::BackendError::transport("cursor already closed"));
        };
        if !cursor.advance().await.map_err(map_error)? {
            return Ok(None);
        }
        cursor.deserialize_current().map(Some).map_err(map_error)
    }

    fn close(&mut self) {
        self.inner.take();
    }
}
