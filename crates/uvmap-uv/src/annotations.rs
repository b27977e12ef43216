//! Free-text notes attached to readings.
//!
//! A note lives inside the reading document of its location window. Only one
//! submission per session runs at a time; a second one while the first is
//! outstanding is dropped.

use std::sync::Arc;

use crate::bucket::Coordinates;
use crate::orchestrator::{FetchOrchestrator, Resolution};
use crate::record::{Annotation, ReadingRecord};
use crate::session::Session;

/// Outcome of a note submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Note written under this document id.
    Saved { id: String },
    /// Another submission was in flight; this one was dropped.
    InFlight,
    /// Text was empty after trimming.
    Empty,
    /// Same text already stored for this location window; nothing written.
    Duplicate { id: String },
    /// No reading could be obtained or the write failed. The draft is kept.
    Unavailable,
}

/// Annotation manager.
pub struct AnnotationManager {
    orchestrator: Arc<FetchOrchestrator>,
}

impl AnnotationManager {
    pub fn new(orchestrator: Arc<FetchOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Attach `text` to the reading for `coords` in the current window.
    ///
    /// The reading is resolved (and persisted) first so the note always
    /// sits next to a UV value. When no reading can be resolved,
    /// `current_uv` (the value on screen) is used instead; without it the
    /// submission fails and the draft is kept.
    pub async fn submit(
        &self,
        session: &Session,
        text: &str,
        current_uv: Option<f64>,
        coords: Coordinates,
        now_ms: i64,
    ) -> SubmitOutcome {
        let Some(_guard) = session.try_begin_submit() else {
            tracing::debug!("Submission already in flight, dropping");
            return SubmitOutcome::InFlight;
        };

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        let store = self.orchestrator.store();
        let key = self.orchestrator.key_for(coords, now_ms);

        let existing = match store.get(&key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Could not read {} before saving note: {}", key, e);
                None
            }
        };
        if existing.as_ref().and_then(ReadingRecord::note) == Some(text) {
            tracing::debug!("Note already stored for {}", key);
            session.clear_draft();
            self.list(session).await;
            return SubmitOutcome::Duplicate { id: key };
        }

        let base = match self.orchestrator.resolve(session, coords, now_ms, true).await {
            Resolution::Served(reading) => reading.to_record(),
            _ => match current_uv {
                Some(uv) => ReadingRecord::new(uv, coords, now_ms),
                None => {
                    tracing::warn!("No UV reading available for {}, note not saved", coords);
                    return SubmitOutcome::Unavailable;
                }
            },
        };

        if let Err(e) = store.put(&key, &base.with_comment(text)).await {
            tracing::error!("Failed to save note for {}: {}", key, e);
            return SubmitOutcome::Unavailable;
        }

        tracing::info!("Saved note for {}", key);
        session.clear_draft();
        self.list(session).await;
        SubmitOutcome::Saved { id: key }
    }

    /// Save a note under its own timestamp id, independent of the location
    /// window. The UV value is copied as given.
    pub async fn save_standalone(
        &self,
        session: &Session,
        text: &str,
        uv: f64,
        coords: Coordinates,
        now_ms: i64,
    ) -> SubmitOutcome {
        let Some(_guard) = session.try_begin_submit() else {
            return SubmitOutcome::InFlight;
        };

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        let id = now_ms.to_string();
        let record = ReadingRecord::new(uv, coords, now_ms).with_comment(text);
        if let Err(e) = self.orchestrator.store().put(&id, &record).await {
            tracing::error!("Failed to save standalone note {}: {}", id, e);
            return SubmitOutcome::Unavailable;
        }

        session.clear_draft();
        self.list(session).await;
        SubmitOutcome::Saved { id }
    }

    /// Refresh and return the annotation listing, in store order.
    ///
    /// On a store failure the previous listing is kept and returned.
    pub async fn list(&self, session: &Session) -> Vec<Annotation> {
        match self.orchestrator.store().list_all().await {
            Ok(stored) => {
                let annotations: Vec<Annotation> =
                    stored.iter().filter_map(Annotation::from_stored).collect();
                session.set_annotations(annotations.clone());
                annotations
            }
            Err(e) => {
                tracing::warn!("Failed to list annotations: {}", e);
                session.annotations()
            }
        }
    }

    /// Remove the document `id` and refresh the listing. Returns whether the
    /// delete reached the store.
    pub async fn delete(&self, session: &Session, id: &str) -> bool {
        if let Err(e) = self.orchestrator.store().delete(id).await {
            tracing::error!("Failed to delete {}: {}", id, e);
            return false;
        }
        tracing::info!("Deleted {}", id);
        self.list(session).await;
        true
    }
}
