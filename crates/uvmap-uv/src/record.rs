use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::bucket::Coordinates;

/// A stored UV reading.
///
/// Serialized with the document shape shared by every store backend:
/// `{ uv, timestamp, dateString, lat, lng, comment? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub uv: f64,
    #[serde(rename = "timestamp")]
    pub captured_at_ms: i64,
    #[serde(rename = "dateString", default)]
    pub date_string: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ReadingRecord {
    /// Fresh record without a comment.
    pub fn new(uv: f64, coords: Coordinates, captured_at_ms: i64) -> Self {
        Self {
            uv,
            captured_at_ms,
            date_string: format_timestamp(captured_at_ms),
            lat: coords.lat,
            lng: coords.lng,
            comment: None,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Whether the reading is younger than `window_ms` at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms.saturating_sub(self.captured_at_ms) < window_ms
    }

    /// Copy of this record carrying `comment`. Reading fields stay untouched.
    pub fn with_comment(&self, comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..self.clone()
        }
    }

    /// Non-empty comment, if any
    pub fn note(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// A record together with its document id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReading {
    pub id: String,
    pub record: ReadingRecord,
}

/// A reading with a note attached, as shown in the annotation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub id: String,
    pub uv: f64,
    pub lat: f64,
    pub lng: f64,
    pub comment: String,
    pub captured_at_ms: i64,
    pub date_string: String,
}

impl Annotation {
    /// Build an annotation from a stored record; `None` when it has no note.
    pub fn from_stored(stored: &StoredReading) -> Option<Self> {
        let comment = stored.record.note()?;
        Some(Self {
            id: stored.id.clone(),
            uv: stored.record.uv,
            lat: stored.record.lat,
            lng: stored.record.lng,
            comment: comment.to_string(),
            captured_at_ms: stored.record.captured_at_ms,
            date_string: stored.record.date_string.clone(),
        })
    }
}

/// Human readable local time for an epoch-millisecond timestamp.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%d/%m/%Y, %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}
