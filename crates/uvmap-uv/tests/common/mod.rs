//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use uvmap_uv::{
    CacheStore, MemoryCacheStore, ProviderError, ReadingRecord, StoreError, StoreResult,
    StoredReading, UvProvider,
};

/// 2024-10-04T00:00:00Z, the start of a cache window.
pub const T0: i64 = 1_728_000_000_000;

/// Provider returning scripted answers and counting calls.
///
/// Each call yields once before answering so concurrent callers interleave.
/// When a gate is set, calls wait for it before answering.
#[derive(Default)]
pub struct StubProvider {
    answers: Mutex<VecDeque<Result<f64, ProviderError>>>,
    fallback: Mutex<Option<Result<f64, ProviderError>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl StubProvider {
    /// Always answers `uv`.
    pub fn returning(uv: f64) -> Self {
        Self::answering(Ok(uv))
    }

    /// Always answers with `answer`.
    pub fn answering(answer: Result<f64, ProviderError>) -> Self {
        Self {
            fallback: Mutex::new(Some(answer)),
            ..Self::default()
        }
    }

    /// Answers in order, then fails with a transport error.
    pub fn sequence(answers: Vec<Result<f64, ProviderError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UvProvider for StubProvider {
    async fn fetch_uv(&self, _lat: f64, _lng: f64) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.answers.lock().pop_front();
        match next {
            Some(answer) => answer,
            None => self
                .fallback
                .lock()
                .clone()
                .unwrap_or_else(|| Err(ProviderError::Transport("no scripted answer".into()))),
        }
    }
}

/// Memory store that records writes and can be switched offline.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCacheStore,
    puts: Mutex<Vec<(String, ReadingRecord)>>,
    offline_reads: AtomicBool,
    offline_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads_offline(self) -> Self {
        self.offline_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_writes_offline(&self, offline: bool) {
        self.offline_writes.store(offline, Ordering::SeqCst);
    }

    pub fn puts(&self) -> Vec<(String, ReadingRecord)> {
        self.puts.lock().clone()
    }

    /// Writes that carried a comment
    pub fn comment_puts(&self) -> usize {
        self.puts
            .lock()
            .iter()
            .filter(|(_, r)| r.comment.is_some())
            .count()
    }

    /// Seed a record without counting it as a write.
    pub async fn seed(&self, key: &str, record: ReadingRecord) {
        self.inner.put(key, &record).await.unwrap();
    }

    pub async fn stored(&self, key: &str) -> Option<ReadingRecord> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<ReadingRecord>> {
        if self.offline_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store offline"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, record: &ReadingRecord) -> StoreResult<()> {
        if self.offline_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store offline"));
        }
        self.puts.lock().push((key.to_string(), record.clone()));
        self.inner.put(key, record).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StoreResult<Vec<StoredReading>> {
        if self.offline_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store offline"));
        }
        self.inner.list_all().await
    }
}
