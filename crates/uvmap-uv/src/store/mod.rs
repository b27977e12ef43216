//! Reading store trait and error types.
//!
//! The store is a document collection keyed by bucket key (or a timestamp
//! for standalone notes). Backends: in-memory, local SQLite, and the
//! Firestore REST API.

pub mod firestore;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use uvmap_core::error::{AppError, DatabaseError};

use crate::record::{ReadingRecord, StoredReading};

pub use firestore::FirestoreCacheStore;
pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A document could not be encoded or decoded.
    #[error("Document codec error: {0}")]
    Codec(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Corruption(msg) => Self::Codec(msg),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => DatabaseError::ConnectionFailed(msg).into(),
            StoreError::Codec(msg) => DatabaseError::Corruption(msg).into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent reading store.
///
/// Writes are unconditional overwrites: two writers racing on the same key
/// end with whichever wrote last.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the record stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<ReadingRecord>>;

    /// Create or replace the record under `key`.
    async fn put(&self, key: &str, record: &ReadingRecord) -> StoreResult<()>;

    /// Remove the record under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Every stored record. Order is backend-defined.
    async fn list_all(&self) -> StoreResult<Vec<StoredReading>>;
}
