//! Per-visitor session state shared by the orchestrator and annotation manager.
//!
//! Holds what the display shows, the "same location" and "submitting"
//! guards, the comment draft, and the last annotation listing.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bucket::Coordinates;
use crate::level::{style_for, ColorTier};
use crate::record::Annotation;

/// Phase of the most recent `resolve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResolvePhase {
    #[default]
    Idle,
    Resolving,
    Served,
    Failed,
}

impl ResolvePhase {
    pub fn on_start(self) -> Self {
        Self::Resolving
    }

    pub fn on_served(self) -> Self {
        Self::Served
    }

    pub fn on_failed(self) -> Self {
        Self::Failed
    }
}

/// What the UV panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub uv: Option<f64>,
    pub level: Option<u8>,
    pub warning: String,
    pub bar_color: &'static str,
    pub bar_width_percent: u8,
    /// Transient message such as the rate-limit notice
    pub notice: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            uv: None,
            level: None,
            warning: String::new(),
            bar_color: ColorTier::Green.hex(),
            bar_width_percent: 0,
            notice: None,
        }
    }
}

impl DisplayState {
    pub fn bar_width(&self) -> String {
        format!("{}%", self.bar_width_percent)
    }
}

/// Session context for one visitor.
#[derive(Debug, Default)]
pub struct Session {
    display: Mutex<DisplayState>,
    phase: Mutex<ResolvePhase>,
    last_resolved: Mutex<Option<Coordinates>>,
    submitting: AtomicBool,
    draft: Mutex<String>,
    annotations: Mutex<Vec<Annotation>>,
}

/// Clears the submitting flag when dropped.
#[derive(Debug)]
pub struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> DisplayState {
        self.display.lock().clone()
    }

    pub fn phase(&self) -> ResolvePhase {
        *self.phase.lock()
    }

    pub fn last_resolved(&self) -> Option<Coordinates> {
        *self.last_resolved.lock()
    }

    /// True when `coords` are exactly the last successfully resolved point.
    pub fn is_same_location(&self, coords: Coordinates) -> bool {
        self.last_resolved.lock().is_some_and(|last| last == coords)
    }

    pub(crate) fn begin_resolve(&self) {
        let mut phase = self.phase.lock();
        *phase = phase.on_start();
    }

    /// Show a reading and remember where it came from.
    pub(crate) fn show_reading(&self, coords: Coordinates, uv: f64, level: u8) {
        let style = style_for(level);
        {
            let mut display = self.display.lock();
            display.uv = Some(uv);
            display.level = Some(level);
            display.warning = style.warning.to_string();
            display.bar_color = style.color;
            display.bar_width_percent = style.bar_width_percent;
            display.notice = None;
        }
        *self.last_resolved.lock() = Some(coords);
        let mut phase = self.phase.lock();
        *phase = phase.on_served();
    }

    /// Record a failed resolution. The displayed reading is left as it was;
    /// the notice is replaced by `notice`, so an older one does not linger.
    pub(crate) fn fail_resolve(&self, notice: Option<&str>) {
        self.display.lock().notice = notice.map(str::to_string);
        let mut phase = self.phase.lock();
        *phase = phase.on_failed();
    }

    /// Claim the submitting flag. `None` when a submission is already running.
    pub fn try_begin_submit(&self) -> Option<SubmitGuard<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard {
                flag: &self.submitting,
            })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn draft(&self) -> String {
        self.draft.lock().clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock() = text.into();
    }

    pub(crate) fn clear_draft(&self) {
        self.draft.lock().clear();
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations.lock().clone()
    }

    pub(crate) fn set_annotations(&self, annotations: Vec<Annotation>) {
        *self.annotations.lock() = annotations;
    }
}
