//! Resolves a UV reading for a point, from the store when fresh, otherwise
//! from the provider.
//!
//! Failures never escape: store errors fall through to the provider, and
//! provider errors leave the session display as it was.

use std::sync::Arc;

use crate::bucket::{derive_key, Coordinates, WINDOW_MS};
use crate::level::{classify_level, style_for, UvStyle};
use crate::provider::{ProviderError, UvProvider, RATE_LIMIT_MESSAGE};
use crate::record::ReadingRecord;
use crate::session::Session;
use crate::store::CacheStore;

/// Where a served reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    Cache,
    Provider,
}

/// A classified reading ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct UvReading {
    pub key: String,
    pub coordinates: Coordinates,
    pub uv: f64,
    pub level: u8,
    pub style: UvStyle,
    pub captured_at_ms: i64,
    pub source: ReadingSource,
}

impl UvReading {
    fn new(
        key: String,
        coordinates: Coordinates,
        uv: f64,
        captured_at_ms: i64,
        source: ReadingSource,
    ) -> Self {
        let level = classify_level(uv);
        Self {
            key,
            coordinates,
            uv,
            level,
            style: style_for(level),
            captured_at_ms,
            source,
        }
    }

    /// Record snapshot of this reading, without a comment.
    pub fn to_record(&self) -> ReadingRecord {
        ReadingRecord::new(self.uv, self.coordinates, self.captured_at_ms)
    }
}

/// Outcome of a resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Served(UvReading),
    /// Point equals the last resolved one; nothing was looked up.
    SameLocation,
    /// Provider answered 429; a notice was put on the display.
    RateLimited,
    /// Provider unreachable or returned an error.
    Failed,
}

impl Resolution {
    pub fn reading(&self) -> Option<&UvReading> {
        match self {
            Self::Served(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Fetch orchestrator.
pub struct FetchOrchestrator {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn UvProvider>,
    window_ms: i64,
}

impl FetchOrchestrator {
    pub fn new(store: Arc<dyn CacheStore>, provider: Arc<dyn UvProvider>) -> Self {
        Self {
            store,
            provider,
            window_ms: WINDOW_MS,
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn key_for(&self, coords: Coordinates, now_ms: i64) -> String {
        derive_key(coords.lat, coords.lng, now_ms, self.window_ms)
    }

    /// Map-click entry point: skips everything when the point is the one
    /// already shown, otherwise resolves and persists.
    pub async fn select_location(
        &self,
        session: &Session,
        coords: Coordinates,
        now_ms: i64,
    ) -> Resolution {
        if session.is_same_location(coords) {
            tracing::debug!("Location {} already displayed, skipping", coords);
            return Resolution::SameLocation;
        }
        self.resolve(session, coords, now_ms, true).await
    }

    /// Resolve a reading for `coords` at `now_ms`.
    ///
    /// A stored record counts as a hit only if it is also younger than the
    /// window. On a miss the provider is called once; the result is written
    /// back when `persist` is set.
    pub async fn resolve(
        &self,
        session: &Session,
        coords: Coordinates,
        now_ms: i64,
        persist: bool,
    ) -> Resolution {
        session.begin_resolve();
        let key = self.key_for(coords, now_ms);

        match self.store.get(&key).await {
            Ok(Some(record)) if record.is_fresh(now_ms, self.window_ms) => {
                tracing::debug!("Cache hit for {}", key);
                let reading = UvReading::new(
                    key,
                    coords,
                    record.uv,
                    record.captured_at_ms,
                    ReadingSource::Cache,
                );
                session.show_reading(coords, reading.uv, reading.level);
                return Resolution::Served(reading);
            }
            Ok(Some(_)) => tracing::debug!("Stale record under {}, refetching", key),
            Ok(None) => tracing::debug!("Cache miss for {}", key),
            Err(e) => tracing::warn!("Store lookup for {} failed, using provider: {}", key, e),
        }

        let uv = match self.provider.fetch_uv(coords.lat, coords.lng).await {
            Ok(uv) => uv,
            Err(ProviderError::RateLimited) => {
                tracing::warn!("UV provider rate limited request for {}", coords);
                session.fail_resolve(Some(RATE_LIMIT_MESSAGE));
                return Resolution::RateLimited;
            }
            Err(e) => {
                tracing::error!("Error fetching UV data for {}: {}", coords, e);
                session.fail_resolve(None);
                return Resolution::Failed;
            }
        };

        let reading = UvReading::new(key, coords, uv, now_ms, ReadingSource::Provider);

        if persist {
            match self.store.put(&reading.key, &reading.to_record()).await {
                Ok(()) => tracing::info!("Stored UV {} for {}", uv, reading.key),
                Err(e) => tracing::error!("Failed to store UV reading {}: {}", reading.key, e),
            }
        }

        session.show_reading(coords, reading.uv, reading.level);
        Resolution::Served(reading)
    }
}
