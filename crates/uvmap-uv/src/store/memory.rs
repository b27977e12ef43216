use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{CacheStore, StoreResult};
use crate::record::{ReadingRecord, StoredReading};

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    documents: Mutex<HashMap<String, ReadingRecord>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<ReadingRecord>> {
        Ok(self.documents.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, record: &ReadingRecord) -> StoreResult<()> {
        self.documents.lock().insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.documents.lock().remove(key);
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<StoredReading>> {
        Ok(self
            .documents
            .lock()
            .iter()
            .map(|(id, record)| StoredReading {
                id: id.clone(),
                record: record.clone(),
            })
            .collect())
    }
}
