//! UV index service for UvMap
//!
//! Resolves UV readings for map points through a time-bucketed document
//! cache in front of an HTTP UV provider, and manages notes attached to
//! those readings.

pub mod annotations;
pub mod bucket;
pub mod export;
pub mod level;
pub mod orchestrator;
pub mod provider;
pub mod record;
pub mod session;
pub mod store;

pub use annotations::{AnnotationManager, SubmitOutcome};
pub use bucket::{derive_key, Coordinates, WINDOW_MS};
pub use level::{classify_level, style_for, UvStyle};
pub use orchestrator::{FetchOrchestrator, ReadingSource, Resolution, UvReading};
pub use provider::{OpenUvClient, ProviderError, UvProvider, RATE_LIMIT_MESSAGE};
pub use record::{Annotation, ReadingRecord, StoredReading};
pub use session::{DisplayState, ResolvePhase, Session};
pub use store::{
    CacheStore, FirestoreCacheStore, MemoryCacheStore, SqliteCacheStore, StoreError, StoreResult,
};
