//! Cache keys: a coordinate pair plus the time window a moment falls in.

use serde::{Deserialize, Serialize};

/// Length of one cache window (3 hours).
pub const WINDOW_MS: i64 = 3 * 60 * 60 * 1000;

/// A clicked map point.
///
/// Equality is exact floating-point equality: two points that look the same
/// on the map but differ in the last digits are different locations, both
/// here and in [`derive_key`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Index of the window containing `now_ms` (floor division).
pub fn window_index(now_ms: i64, window_ms: i64) -> i64 {
    now_ms.div_euclid(window_ms)
}

/// Derive the cache key for a point and moment: `"{lat}-{lng}-{window}"`.
///
/// Coordinates are written with their shortest round-trip decimal form and
/// no rounding, so distinct values always give distinct keys. Rust never
/// switches to exponent notation here, so very small magnitudes print as
/// plain decimals.
pub fn derive_key(lat: f64, lng: f64, now_ms: i64, window_ms: i64) -> String {
    format!("{}-{}-{}", lat, lng, window_index(now_ms, window_ms))
}
