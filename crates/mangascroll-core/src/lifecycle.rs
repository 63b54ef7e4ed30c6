//! Load tracking for the embedded page.
//!
//! Timers are plain deadlines checked by `poll`, so the host decides how time
//! advances. A load or error signal replaces the watchdog; a new URL replaces
//! everything.

use crate::events::LoadOutcome;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Wait after a load signal before measurements are trusted.
    pub settle_delay: Duration,
    /// Wait after an error signal before navigation is unblocked.
    pub error_recovery_delay: Duration,
    /// Longest wait for any signal before the frame is forced ready.
    pub load_watchdog: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            settle_delay: Duration::from_millis(300),
            error_recovery_delay: Duration::from_millis(1000),
            load_watchdog: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LoadPhase {
    /// No URL assigned yet.
    Empty,
    /// Waiting for the frame to signal load or error.
    Loading,
    /// Signal received; waiting out the settle delay.
    Settling,
    Ready,
}

/// The currently displayed remote page.
#[derive(Debug, Clone)]
pub struct ContentFrame {
    config: LifecycleConfig,
    source_url: Option<String>,
    loaded: bool,
    phase: LoadPhase,
    pending_outcome: Option<LoadOutcome>,
    last_outcome: Option<LoadOutcome>,
    settle_deadline: Option<Instant>,
    watchdog_deadline: Option<Instant>,
}

impl ContentFrame {
    pub fn new(config: LifecycleConfig) -> Self {
        ContentFrame {
            config,
            source_url: None,
            loaded: false,
            phase: LoadPhase::Empty,
            pending_outcome: None,
            last_outcome: None,
            settle_deadline: None,
            watchdog_deadline: None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<LoadOutcome> {
        self.last_outcome
    }

    /// Assign a new source. The frame is unloaded until a signal settles or the
    /// watchdog fires.
    pub fn begin_load(&mut self, url: impl Into<String>, now: Instant) {
        let url = url.into();
        info!(url = %url, "Loading content");
        self.source_url = Some(url);
        self.loaded = false;
        self.phase = LoadPhase::Loading;
        self.pending_outcome = None;
        self.last_outcome = None;
        self.settle_deadline = None;
        self.watchdog_deadline = Some(now + self.config.load_watchdog);
    }

    /// The frame reported a completed load. Also accepted on a ready frame,
    /// which happens when the embedded page navigates on its own.
    pub fn frame_loaded(&mut self, now: Instant) -> bool {
        if self.phase == LoadPhase::Empty {
            debug!("Ignoring load signal without a source");
            return false;
        }
        self.settle(LoadOutcome::Loaded, now + self.config.settle_delay);
        true
    }

    pub fn frame_failed(&mut self, now: Instant) -> bool {
        if self.phase == LoadPhase::Empty {
            debug!("Ignoring error signal without a source");
            return false;
        }
        warn!(url = self.source_url.as_deref().unwrap_or(""), "Content failed to load");
        self.settle(LoadOutcome::Failed, now + self.config.error_recovery_delay);
        true
    }

    /// Fire any due timer. Returns the outcome when the frame just became ready.
    pub fn poll(&mut self, now: Instant) -> Option<LoadOutcome> {
        if let Some(deadline) = self.settle_deadline {
            if now >= deadline {
                let outcome = self.pending_outcome.take().unwrap_or(LoadOutcome::Loaded);
                return Some(self.mark_ready(outcome));
            }
            return None;
        }
        if let Some(deadline) = self.watchdog_deadline {
            if now >= deadline {
                warn!(
                    url = self.source_url.as_deref().unwrap_or(""),
                    "No load signal before watchdog; unblocking navigation"
                );
                return Some(self.mark_ready(LoadOutcome::TimedOut));
            }
        }
        None
    }

    /// Earliest instant at which `poll` could change state.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle_deadline.or(self.watchdog_deadline)
    }

    /// Drop the current source entirely.
    pub fn clear(&mut self) {
        *self = ContentFrame::new(self.config);
    }

    fn settle(&mut self, outcome: LoadOutcome, deadline: Instant) {
        self.loaded = false;
        self.phase = LoadPhase::Settling;
        self.pending_outcome = Some(outcome);
        self.settle_deadline = Some(deadline);
        self.watchdog_deadline = None;
    }

    fn mark_ready(&mut self, outcome: LoadOutcome) -> LoadOutcome {
        self.loaded = true;
        self.phase = LoadPhase::Ready;
        self.settle_deadline = None;
        self.watchdog_deadline = None;
        self.last_outcome = Some(outcome);
        info!(
            url = self.source_url.as_deref().unwrap_or(""),
            ?outcome,
            "Content ready"
        );
        outcome
    }
}
