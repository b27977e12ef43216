//! SQLite-backed document store.
//!
//! Documents are kept as JSON bodies in a single `documents` table keyed by
//! `(collection, id)`, mirroring the remote document store so either can be
//! swapped in.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uvmap_core::error::RusqliteErrorExt;

use super::{CacheStore, StoreError, StoreResult};
use crate::record::{ReadingRecord, StoredReading};

/// SQLite document store for readings.
///
/// Every query runs on the blocking pool so the async callers are never
/// stalled by disk I/O or by another holder of the connection.
pub struct SqliteCacheStore {
    conn: Arc<Mutex<Connection>>,
    collection: Arc<str>,
}

fn db_err(err: rusqlite::Error) -> StoreError {
    err.into_database_error().into()
}

impl SqliteCacheStore {
    /// Open (or create) the store at `path`.
    pub fn new<P: AsRef<Path>>(path: P, collection: impl Into<String>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::unavailable(format!("Failed to create store directory: {}", e))
            })?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::with_connection(conn, collection)
    }

    /// In-memory database, same schema.
    pub fn in_memory(collection: impl Into<String>) -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: impl Into<String>) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: Arc::from(collection.into()),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        let collection = self.collection.clone();
        tokio::task::spawn_blocking(move || op(&conn.lock(), &collection))
            .await
            .map_err(|e| StoreError::unavailable(format!("SQLite task failed: {}", e)))?
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        "#,
    )
    .map_err(db_err)
}

fn decode(id: &str, body: &str) -> StoreResult<ReadingRecord> {
    serde_json::from_str(body)
        .map_err(|e| StoreError::codec(format!("Document {} is malformed: {}", id, e)))
}

fn get_sync(conn: &Connection, collection: &str, key: &str) -> StoreResult<Option<ReadingRecord>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;

    body.map(|b| decode(key, &b)).transpose()
}

fn put_sync(conn: &Connection, collection: &str, key: &str, body: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
        params![collection, key, body],
    )
    .map_err(db_err)?;
    Ok(())
}

fn delete_sync(conn: &Connection, collection: &str, key: &str) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, key],
    )
    .map_err(db_err)?;
    Ok(())
}

fn list_sync(conn: &Connection, collection: &str) -> StoreResult<Vec<StoredReading>> {
    let mut stmt = conn
        .prepare("SELECT id, body FROM documents WHERE collection = ?1")
        .map_err(db_err)?;

    let rows = stmt
        .query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;

    let mut readings = Vec::with_capacity(rows.len());
    for (id, body) in rows {
        match decode(&id, &body) {
            Ok(record) => readings.push(StoredReading { id, record }),
            Err(e) => tracing::warn!("Skipping unreadable document: {}", e),
        }
    }
    Ok(readings)
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<ReadingRecord>> {
        let key = key.to_string();
        self.run(move |conn, collection| get_sync(conn, collection, &key))
            .await
    }

    async fn put(&self, key: &str, record: &ReadingRecord) -> StoreResult<()> {
        let key = key.to_string();
        let body = serde_json::to_string(record).map_err(|e| StoreError::codec(e.to_string()))?;
        self.run(move |conn, collection| put_sync(conn, collection, &key, &body))
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = key.to_string();
        self.run(move |conn, collection| delete_sync(conn, collection, &key))
            .await
    }

    async fn list_all(&self) -> StoreResult<Vec<StoredReading>> {
        self.run(list_sync).await
    }
}
