//! Reader-level coordinator.
//!
//! `ReaderSession` glues the scroll driver to the content frame, the chapter
//! navigator and the UI observers. Each public operation finishes its state
//! changes before any observer is called.

use crate::config::EngineConfig;
use crate::container::ScrollContainer;
use crate::detector::EndDetector;
use crate::driver::{ScrollDriver, StartOutcome, StartRejection, TickOutcome};
use crate::events::{
    BoundaryEvent, EngineEvent, LoadOutcome, LoadStateEvent, Notice, Observers,
};
use crate::lifecycle::{ContentFrame, LoadPhase};
use crate::navigation::{ChapterNavigator, NavigationError};
use crate::protocol::{ChapterInfo, proxy_path};
use crate::scheduler::{FrameHandle, FrameScheduler, ManualFrameScheduler};
use crate::session::ScrollDirection;
use crate::shortcuts::{KeyModifiers, Keymap, ShortcutAction};
use crate::speed::SpeedLevel;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ReaderSnapshot {
    pub source_url: String,
    pub proxy_url: String,
    pub chapter: u32,
    pub chapter_pattern: String,
    pub running: bool,
    pub speed: SpeedLevel,
    pub direction: ScrollDirection,
    pub step: f64,
    pub loaded: bool,
    pub phase: LoadPhase,
    pub offset: Option<f64>,
    pub last_error: Option<String>,
    /// Metadata from `fetchInfo` for the current page, once the host supplies it.
    pub chapter_info: Option<ChapterInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderCommand {
    GetSnapshot,
    Start,
    Pause,
    TogglePlayPause,
    SetSpeed { level: i64 },
    SpeedUp,
    SpeedDown,
    SetDirection { direction: ScrollDirection },
    ToggleDirection,
    LoadUrl { url: String },
    NextChapter,
    PrevChapter,
    SetChapterPattern { pattern: String },
    FrameLoaded,
    FrameFailed { detail: String },
    KeyPressed { key: String, modifiers: KeyModifiers },
    SetChapterInfo { info: ChapterInfo },
}

impl ReaderCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::Start => "reader_start",
            Self::Pause => "reader_pause",
            Self::TogglePlayPause => "reader_toggle_play_pause",
            Self::SetSpeed { .. } => "reader_set_speed",
            Self::SpeedUp => "reader_speed_up",
            Self::SpeedDown => "reader_speed_down",
            Self::SetDirection { .. } => "reader_set_direction",
            Self::ToggleDirection => "reader_toggle_direction",
            Self::LoadUrl { .. } => "reader_load_url",
            Self::NextChapter => "reader_next_chapter",
            Self::PrevChapter => "reader_prev_chapter",
            Self::SetChapterPattern { .. } => "reader_set_chapter_pattern",
            Self::FrameLoaded => "reader_frame_loaded",
            Self::FrameFailed { .. } => "reader_frame_failed",
            Self::KeyPressed { .. } => "reader_key_pressed",
            Self::SetChapterInfo { .. } => "reader_set_chapter_info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderEvent {
    pub action: &'static str,
    pub snapshot: ReaderSnapshot,
}

pub struct ReaderSession<C, S> {
    driver: ScrollDriver<S>,
    frame: ContentFrame,
    container: Option<C>,
    navigator: ChapterNavigator,
    keymap: Keymap,
    chapter: u32,
    chapter_info: Option<ChapterInfo>,
    last_error: Option<String>,
    observers: Observers,
    queued: Vec<EngineEvent>,
}

impl<C: ScrollContainer, S: FrameScheduler> ReaderSession<C, S> {
    pub fn new(config: EngineConfig, scheduler: S) -> Self {
        let navigator = ChapterNavigator::new(&config.chapter_pattern).unwrap_or_else(|err| {
            warn!(%err, "Invalid chapter pattern; using default");
            ChapterNavigator::default()
        });
        let driver = ScrollDriver::new(
            scheduler,
            EndDetector::new(config.detector),
            config.curve,
            config.default_speed,
            config.default_direction,
        );
        ReaderSession {
            driver,
            frame: ContentFrame::new(config.lifecycle),
            container: None,
            navigator,
            keymap: config.keymap,
            chapter: 1,
            chapter_info: None,
            last_error: None,
            observers: Observers::default(),
            queued: Vec::new(),
        }
    }

    pub fn on_boundary_reached(&mut self, callback: impl FnMut(&BoundaryEvent) + 'static) {
        self.observers.on_boundary_reached(callback);
    }

    pub fn on_load_state_changed(&mut self, callback: impl FnMut(&LoadStateEvent) + 'static) {
        self.observers.on_load_state_changed(callback);
    }

    pub fn on_notice(&mut self, callback: impl FnMut(&Notice) + 'static) {
        self.observers.on_notice(callback);
    }

    pub fn attach_container(&mut self, container: C) -> Option<C> {
        self.container.replace(container)
    }

    /// Remove the container. A running session is paused first.
    pub fn detach_container(&mut self) -> Option<C> {
        self.driver.pause();
        self.container.take()
    }

    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.container.as_mut()
    }

    pub fn driver(&self) -> &ScrollDriver<S> {
        &self.driver
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.driver.scheduler_mut()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn is_loaded(&self) -> bool {
        self.frame.is_loaded()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.frame.source_url()
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.frame.next_deadline()
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let source_url = self.frame.source_url().unwrap_or_default().to_string();
        ReaderSnapshot {
            proxy_url: proxy_path(&source_url),
            source_url,
            chapter: self.chapter,
            chapter_pattern: self.navigator.pattern().to_string(),
            running: self.driver.is_running(),
            speed: self.driver.speed(),
            direction: self.driver.direction(),
            step: self.driver.step(),
            loaded: self.frame.is_loaded(),
            phase: self.frame.phase(),
            offset: self.container.as_ref().map(|c| c.metrics().offset),
            last_error: self.last_error.clone(),
            chapter_info: self.chapter_info.clone(),
        }
    }

    pub fn apply_command(&mut self, command: ReaderCommand, now: Instant) -> ReaderEvent {
        let action = command.action();
        match command {
            ReaderCommand::GetSnapshot => {}
            ReaderCommand::Start => {
                self.start();
            }
            ReaderCommand::Pause => {
                self.pause();
            }
            ReaderCommand::TogglePlayPause => self.toggle_play_pause(),
            ReaderCommand::SetSpeed { level } => self.set_speed(SpeedLevel::new(level)),
            ReaderCommand::SpeedUp => self.speed_up(),
            ReaderCommand::SpeedDown => self.speed_down(),
            ReaderCommand::SetDirection { direction } => self.set_direction(direction),
            ReaderCommand::ToggleDirection => self.toggle_direction(),
            ReaderCommand::LoadUrl { url } => {
                self.load_url(&url, now);
            }
            ReaderCommand::NextChapter => {
                let _ = self.next_chapter(now);
            }
            ReaderCommand::PrevChapter => {
                let _ = self.prev_chapter(now);
            }
            ReaderCommand::SetChapterPattern { pattern } => {
                let _ = self.set_chapter_pattern(&pattern);
            }
            ReaderCommand::FrameLoaded => self.frame_loaded(now),
            ReaderCommand::FrameFailed { detail } => self.frame_failed(&detail, now),
            ReaderCommand::KeyPressed { key, modifiers } => {
                self.handle_key(&key, modifiers, now);
            }
            ReaderCommand::SetChapterInfo { info } => {
                self.set_chapter_info(info);
            }
        }
        ReaderEvent {
            action,
            snapshot: self.snapshot(),
        }
    }

    pub fn start(&mut self) -> StartOutcome {
        let outcome = self
            .driver
            .start(self.container.as_ref(), self.frame.is_loaded());
        self.report_start(outcome);
        self.flush();
        outcome
    }

    /// Returns whether a run was active.
    pub fn pause(&mut self) -> bool {
        self.driver.pause()
    }

    pub fn toggle_play_pause(&mut self) {
        if self.driver.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn set_speed(&mut self, speed: SpeedLevel) {
        let restarted = self
            .driver
            .set_speed(speed, self.container.as_ref(), self.frame.is_loaded());
        if let Some(outcome) = restarted {
            self.report_start(outcome);
        }
        self.flush();
    }

    pub fn speed_up(&mut self) {
        self.set_speed(self.driver.speed().faster());
    }

    pub fn speed_down(&mut self) {
        self.set_speed(self.driver.speed().slower());
    }

    pub fn set_direction(&mut self, direction: ScrollDirection) {
        let restarted =
            self.driver
                .set_direction(direction, self.container.as_ref(), self.frame.is_loaded());
        if let Some(outcome) = restarted {
            self.report_start(outcome);
        }
        self.flush();
    }

    pub fn toggle_direction(&mut self) {
        self.set_direction(self.driver.direction().toggled());
    }

    /// Point the frame at a new page. Any run is halted before this returns.
    /// Returns false for a blank URL.
    pub fn load_url(&mut self, url: &str, now: Instant) -> bool {
        let url = url.trim();
        if url.is_empty() {
            self.emit(EngineEvent::Notice(Notice::error("Error", "Please enter a URL")));
            self.flush();
            return false;
        }

        self.driver.pause();
        self.frame.begin_load(url, now);
        self.chapter = self.navigator.chapter_number(url);
        self.chapter_info = None;
        self.last_error = None;
        self.emit(EngineEvent::LoadState(LoadStateEvent {
            source_url: url.to_string(),
            loaded: false,
            outcome: None,
        }));
        self.flush();
        true
    }

    pub fn next_chapter(&mut self, now: Instant) -> Result<String, NavigationError> {
        let target = self
            .navigator
            .next_url(self.frame.source_url().unwrap_or_default());
        self.navigate(target, now)
    }

    pub fn prev_chapter(&mut self, now: Instant) -> Result<String, NavigationError> {
        let target = self
            .navigator
            .prev_url(self.frame.source_url().unwrap_or_default());
        self.navigate(target, now)
    }

    pub fn set_chapter_pattern(&mut self, pattern: &str) -> Result<(), NavigationError> {
        match ChapterNavigator::new(pattern) {
            Ok(navigator) => {
                self.navigator = navigator;
                if let Some(url) = self.frame.source_url() {
                    self.chapter = self.navigator.chapter_number(url);
                }
                Ok(())
            }
            Err(err) => {
                self.emit(EngineEvent::Notice(Notice::error(
                    "Invalid chapter pattern",
                    err.to_string(),
                )));
                self.flush();
                Err(err)
            }
        }
    }

    /// The embedded page signalled a completed load. A ready frame goes back
    /// to settling, and observers hear about it.
    pub fn frame_loaded(&mut self, now: Instant) {
        self.driver.pause();
        let was_loaded = self.frame.is_loaded();
        self.frame.frame_loaded(now);
        self.report_unloaded(was_loaded);
        self.flush();
    }

    pub fn frame_failed(&mut self, detail: &str, now: Instant) {
        self.driver.pause();
        let was_loaded = self.frame.is_loaded();
        if self.frame.frame_failed(now) {
            self.last_error = Some(Notice::load_failed(detail).description);
            self.report_unloaded(was_loaded);
            self.emit(EngineEvent::Notice(Notice::load_failed(detail)));
        }
        self.flush();
    }

    /// Store chapter metadata fetched for the current page. Ignored until a
    /// URL has been loaded.
    pub fn set_chapter_info(&mut self, info: ChapterInfo) -> bool {
        if self.frame.source_url().is_none() {
            debug!("Ignoring chapter info without a source");
            return false;
        }
        debug!(title = %info.title, pages = info.page_count, "Chapter info received");
        self.chapter_info = Some(info);
        true
    }

    /// Advance lifecycle timers. Returns the outcome when the frame just became
    /// ready.
    pub fn poll(&mut self, now: Instant) -> Option<LoadOutcome> {
        let outcome = self.frame.poll(now)?;
        if outcome == LoadOutcome::Loaded {
            self.reset_to_start_edge();
        }
        self.emit(EngineEvent::LoadState(LoadStateEvent {
            source_url: self.frame.source_url().unwrap_or_default().to_string(),
            loaded: true,
            outcome: Some(outcome),
        }));
        self.flush();
        Some(outcome)
    }

    /// Host callback for a fired frame.
    pub fn on_frame(&mut self, handle: FrameHandle) -> TickOutcome {
        let outcome = self
            .driver
            .tick(handle, self.container.as_mut(), self.frame.is_loaded());
        if let TickOutcome::Stopped(event) = outcome {
            self.emit(EngineEvent::Boundary(event));
            self.emit(EngineEvent::Notice(Notice::boundary(event.direction)));
        }
        self.flush();
        outcome
    }

    /// Resolve and run a keyboard shortcut. Keys are ignored until the content
    /// is loaded.
    pub fn handle_key(
        &mut self,
        key: &str,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> Option<ShortcutAction> {
        if !self.frame.is_loaded() {
            debug!(key, "Ignoring shortcut while content loads");
            return None;
        }
        let action = self.keymap.action_for(key, modifiers)?;
        match action {
            ShortcutAction::TogglePlayPause => self.toggle_play_pause(),
            ShortcutAction::SpeedUp => self.speed_up(),
            ShortcutAction::SpeedDown => self.speed_down(),
            ShortcutAction::ToggleDirection => self.toggle_direction(),
            ShortcutAction::NextChapter => {
                let _ = self.next_chapter(now);
            }
            ShortcutAction::PrevChapter => {
                let _ = self.prev_chapter(now);
            }
        }
        Some(action)
    }

    /// Stop everything and forget the current page and container.
    pub fn teardown(&mut self) -> Option<C> {
        self.driver.pause();
        self.frame.clear();
        self.chapter_info = None;
        self.queued.clear();
        info!("Reader session torn down");
        self.container.take()
    }

    fn navigate(
        &mut self,
        target: Result<String, NavigationError>,
        now: Instant,
    ) -> Result<String, NavigationError> {
        match target {
            Ok(url) => {
                info!(url = %url, "Navigating to chapter");
                self.load_url(&url, now);
                Ok(url)
            }
            Err(err) => {
                warn!(%err, "Chapter navigation rejected");
                self.last_error = Some(err.to_string());
                self.emit(EngineEvent::Notice(Notice::error("Navigation", err.to_string())));
                self.flush();
                Err(err)
            }
        }
    }

    fn report_unloaded(&mut self, was_loaded: bool) {
        if was_loaded && !self.frame.is_loaded() {
            self.emit(EngineEvent::LoadState(LoadStateEvent {
                source_url: self.frame.source_url().unwrap_or_default().to_string(),
                loaded: false,
                outcome: None,
            }));
        }
    }

    fn reset_to_start_edge(&mut self) {
        let direction = self.driver.direction();
        let detector = *self.driver.detector();
        let Some(container) = self.container.as_mut() else {
            return;
        };
        let edge = match direction {
            ScrollDirection::Forward => 0.0,
            ScrollDirection::Backward => detector.classify(&container.metrics()).effective_limit(),
        };
        debug!(%direction, edge, "Resetting offset to start edge");
        container.set_offset(edge);
    }

    fn report_start(&mut self, outcome: StartOutcome) {
        let notice = match outcome {
            StartOutcome::Started { .. } => return,
            StartOutcome::Rejected(StartRejection::ContentNotReady) => Notice::content_not_ready(),
            StartOutcome::Rejected(StartRejection::ContainerMissing) => Notice::container_missing(),
        };
        self.emit(EngineEvent::Notice(notice));
    }

    fn emit(&mut self, event: EngineEvent) {
        self.queued.push(event);
    }

    fn flush(&mut self) {
        for event in std::mem::take(&mut self.queued) {
            self.observers.dispatch(&event);
        }
    }
}

impl<C: ScrollContainer> ReaderSession<C, ManualFrameScheduler> {
    /// Fire every frame that is currently due.
    pub fn run_frame(&mut self) -> Vec<TickOutcome> {
        let due = self.driver.scheduler_mut().take_due();
        due.into_iter().map(|handle| self.on_frame(handle)).collect()
    }
}

impl<C, S> std::fmt::Debug for ReaderSession<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSession")
            .field("source_url", &self.frame.source_url())
            .field("phase", &self.frame.phase())
            .field("chapter", &self.chapter)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
