//! Notifications and observer registration.

use crate::detector::StopReason;
use crate::session::ScrollDirection;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NoticeVariant {
    #[default]
    Default,
    Destructive,
    Success,
}

/// Toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn boundary(direction: ScrollDirection) -> Self {
        match direction {
            ScrollDirection::Forward => {
                Notice::info("End of chapter", "You've reached the end of this chapter.")
            }
            ScrollDirection::Backward => {
                Notice::info("Top of chapter", "You've reached the top of this chapter.")
            }
        }
    }

    pub fn content_not_ready() -> Self {
        Notice::info(
            "Content still loading",
            "Please wait for the content to fully load before scrolling.",
        )
    }

    pub fn container_missing() -> Self {
        Notice::error(
            "Content unavailable",
            "Could not access the manga content. Please try reloading the page.",
        )
    }

    pub fn load_failed(detail: &str) -> Self {
        let mut description = String::from(
            "Failed to load manga content. \
             The URL might be invalid or the server is not responding.",
        );
        if !detail.trim().is_empty() {
            description.push_str(" (");
            description.push_str(detail.trim());
            description.push(')');
        }
        Notice::error("Load failed", description)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Emitted once when a run halts at the start or end of the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoundaryEvent {
    pub direction: ScrollDirection,
    pub reason: StopReason,
    pub offset: f64,
}

/// How a load ended up marked ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoadStateEvent {
    pub source_url: String,
    pub loaded: bool,
    #[ts(optional)]
    pub outcome: Option<LoadOutcome>,
}

type BoundaryCallback = Box<dyn FnMut(&BoundaryEvent)>;
type LoadStateCallback = Box<dyn FnMut(&LoadStateEvent)>;
type NoticeCallback = Box<dyn FnMut(&Notice)>;

/// Observers registered by the UI layer.
#[derive(Default)]
pub struct Observers {
    boundary: Vec<BoundaryCallback>,
    load_state: Vec<LoadStateCallback>,
    notice: Vec<NoticeCallback>,
}

impl Observers {
    pub fn on_boundary_reached(&mut self, callback: impl FnMut(&BoundaryEvent) + 'static) {
        self.boundary.push(Box::new(callback));
    }

    pub fn on_load_state_changed(&mut self, callback: impl FnMut(&LoadStateEvent) + 'static) {
        self.load_state.push(Box::new(callback));
    }

    pub fn on_notice(&mut self, callback: impl FnMut(&Notice) + 'static) {
        self.notice.push(Box::new(callback));
    }

    pub(crate) fn dispatch(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Boundary(boundary) => {
                for callback in &mut self.boundary {
                    callback(boundary);
                }
            }
            EngineEvent::LoadState(state) => {
                for callback in &mut self.load_state {
                    callback(state);
                }
            }
            EngineEvent::Notice(notice) => {
                for callback in &mut self.notice {
                    callback(notice);
                }
            }
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("boundary", &self.boundary.len())
            .field("load_state", &self.load_state.len())
            .field("notice", &self.notice.len())
            .finish()
    }
}

/// Side effect queued during an operation and delivered once it completes.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Boundary(BoundaryEvent),
    LoadState(LoadStateEvent),
    Notice(Notice),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn boundary_notice_names_the_direction() {
        assert_eq!(Notice::boundary(ScrollDirection::Forward).title, "End of chapter");
        assert_eq!(Notice::boundary(ScrollDirection::Backward).title, "Top of chapter");
    }

    #[test]
    fn load_failure_appends_detail() {
        let notice = Notice::load_failed("status 502");
        assert_eq!(notice.variant, NoticeVariant::Destructive);
        assert!(notice.description.ends_with("(status 502)"));
        assert!(!Notice::load_failed("  ").description.contains('('));
    }

    #[test]
    fn dispatch_reaches_only_matching_observers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::default();
        let sink = Rc::clone(&seen);
        observers.on_notice(move |notice| sink.borrow_mut().push(notice.title.clone()));
        let sink = Rc::clone(&seen);
        observers.on_boundary_reached(move |_| sink.borrow_mut().push("boundary".to_string()));

        observers.dispatch(&EngineEvent::Notice(Notice::content_not_ready()));
        observers.dispatch(&EngineEvent::LoadState(LoadStateEvent {
            source_url: "https://example.com".to_string(),
            loaded: true,
            outcome: Some(LoadOutcome::Loaded),
        }));

        assert_eq!(*seen.borrow(), vec!["Content still loading".to_string()]);
    }
}
