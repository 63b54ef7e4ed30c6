//! Frame-synchronized auto-scroll loop.
//!
//! The driver is the only owner of the animation lifecycle. Every operation
//! that could race a pending frame cancels that frame before touching session
//! state, and a frame whose handle is no longer the pending one is ignored.

use crate::container::ScrollContainer;
use crate::detector::{Detection, EndDetector};
use crate::events::BoundaryEvent;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::session::{ScrollDirection, ScrollSession};
use crate::speed::{SpeedCurve, SpeedLevel};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    ContentNotReady,
    ContainerMissing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartOutcome {
    Started { offset: f64 },
    Rejected(StartRejection),
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, StartOutcome::Started { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The frame was cancelled or superseded; nothing happened.
    Stale,
    /// Container detached or content unloaded; the run ended without moving.
    Halted,
    Advanced { from: f64, to: f64, step: f64 },
    Stopped(BoundaryEvent),
}

#[derive(Debug)]
pub struct ScrollDriver<S> {
    scheduler: S,
    detector: EndDetector,
    curve: SpeedCurve,
    speed: SpeedLevel,
    direction: ScrollDirection,
    session: Option<ScrollSession>,
    pending_frame: Option<FrameHandle>,
}

impl<S: FrameScheduler> ScrollDriver<S> {
    pub fn new(
        scheduler: S,
        detector: EndDetector,
        curve: SpeedCurve,
        speed: SpeedLevel,
        direction: ScrollDirection,
    ) -> Self {
        ScrollDriver {
            scheduler,
            detector,
            curve,
            speed,
            direction,
            session: None,
            pending_frame: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ScrollSession> {
        self.session.as_ref()
    }

    pub fn speed(&self) -> SpeedLevel {
        self.speed
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn detector(&self) -> &EndDetector {
        &self.detector
    }

    /// Per-frame distance at the current speed.
    pub fn step(&self) -> f64 {
        self.curve.step_for(self.speed)
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn start<C: ScrollContainer>(
        &mut self,
        container: Option<&C>,
        loaded: bool,
    ) -> StartOutcome {
        if !loaded {
            warn!("Auto-scroll start rejected: content still loading");
            return StartOutcome::Rejected(StartRejection::ContentNotReady);
        }
        let Some(container) = container else {
            warn!("Auto-scroll start rejected: no scroll container attached");
            return StartOutcome::Rejected(StartRejection::ContainerMissing);
        };

        self.cancel_pending();
        let offset = container.metrics().offset;
        self.session = Some(ScrollSession::new(self.direction, self.speed, offset));
        self.pending_frame = Some(self.scheduler.request_frame());
        info!(
            speed = %self.speed,
            direction = %self.direction,
            offset,
            "Auto-scrolling started"
        );
        StartOutcome::Started { offset }
    }

    /// Stop the run. Returns whether a run was active.
    pub fn pause(&mut self) -> bool {
        self.cancel_pending();
        let was_running = self.session.take().is_some();
        if was_running {
            info!("Auto-scrolling paused");
        }
        was_running
    }

    pub fn tick<C: ScrollContainer>(
        &mut self,
        handle: FrameHandle,
        container: Option<&mut C>,
        loaded: bool,
    ) -> TickOutcome {
        if self.pending_frame != Some(handle) {
            trace!(frame = handle.id(), "Ignoring superseded frame");
            return TickOutcome::Stale;
        }
        self.pending_frame = None;

        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Stale;
        };
        let container = match container {
            Some(container) if loaded => container,
            _ => {
                debug!(loaded, "Frame fired without usable content; ending run");
                self.session = None;
                return TickOutcome::Halted;
            }
        };

        let metrics = container.metrics();
        let direction = session.direction();
        let detection = self.detector.should_stop(&metrics, direction, session);
        if let Detection::Stop { reason, .. } = detection {
            self.cancel_pending();
            self.session = None;
            info!(%direction, %reason, offset = metrics.offset, "Auto-scrolling reached boundary");
            return TickOutcome::Stopped(BoundaryEvent {
                direction,
                reason,
                offset: metrics.offset,
            });
        }

        let step = self.curve.step_for(session.speed());
        let from = metrics.offset;
        container.set_offset(from + direction.sign() * step);
        let to = container.metrics().offset;
        trace!(from, to, step, "Advanced auto-scroll");

        if self.session.is_some() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
        TickOutcome::Advanced { from, to, step }
    }

    /// Change speed; a running session is rebuilt rather than adjusted.
    pub fn set_speed<C: ScrollContainer>(
        &mut self,
        speed: SpeedLevel,
        container: Option<&C>,
        loaded: bool,
    ) -> Option<StartOutcome> {
        if speed == self.speed {
            return None;
        }
        debug!(from = %self.speed, to = %speed, "Scroll speed changed");
        self.speed = speed;
        self.restart_if_running(container, loaded)
    }

    /// Change direction; a running session is rebuilt so stall counts never
    /// carry across a reversal.
    pub fn set_direction<C: ScrollContainer>(
        &mut self,
        direction: ScrollDirection,
        container: Option<&C>,
        loaded: bool,
    ) -> Option<StartOutcome> {
        if direction == self.direction {
            return None;
        }
        debug!(from = %self.direction, to = %direction, "Scroll direction changed");
        self.direction = direction;
        self.restart_if_running(container, loaded)
    }

    fn restart_if_running<C: ScrollContainer>(
        &mut self,
        container: Option<&C>,
        loaded: bool,
    ) -> Option<StartOutcome> {
        if !self.is_running() {
            return None;
        }
        self.pause();
        Some(self.start(container, loaded))
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ScrollMetrics, SimulatedContainer};
    use crate::detector::{DetectorConfig, StopReason};
    use crate::scheduler::ManualFrameScheduler;

    fn driver(speed: i64, direction: ScrollDirection) -> ScrollDriver<ManualFrameScheduler> {
        ScrollDriver::new(
            ManualFrameScheduler::new(),
            EndDetector::new(DetectorConfig::default()),
            SpeedCurve::default(),
            SpeedLevel::new(speed),
            direction,
        )
    }

    /// Fire every due frame once; returns the outcomes.
    fn pump(
        driver: &mut ScrollDriver<ManualFrameScheduler>,
        container: &mut SimulatedContainer,
    ) -> Vec<TickOutcome> {
        let due = driver.scheduler_mut().take_due();
        due.into_iter()
            .map(|handle| driver.tick(handle, Some(&mut *container), true))
            .collect()
    }

    #[test]
    fn start_is_rejected_until_loaded() {
        let mut driver = driver(3, ScrollDirection::Forward);
        let container = SimulatedContainer::reliable(1000.0, 500.0);

        let outcome = driver.start(Some(&container), false);
        assert_eq!(outcome, StartOutcome::Rejected(StartRejection::ContentNotReady));
        assert!(!driver.is_running());
        assert_eq!(driver.scheduler().requested_count(), 0);
    }

    #[test]
    fn start_without_container_is_rejected() {
        let mut driver = driver(3, ScrollDirection::Forward);
        let outcome = driver.start::<SimulatedContainer>(None, true);
        assert_eq!(outcome, StartOutcome::Rejected(StartRejection::ContainerMissing));
        assert!(!driver.is_running());
    }

    #[test]
    fn reliable_forward_run_stops_exactly_once() {
        let mut driver = driver(5, ScrollDirection::Forward);
        let mut container = SimulatedContainer::reliable(1000.0, 500.0);
        assert!(driver.start(Some(&container), true).is_started());

        let mut stops = Vec::new();
        let mut last = container.offset();
        for _ in 0..1000 {
            for outcome in pump(&mut driver, &mut container) {
                match outcome {
                    TickOutcome::Advanced { to, .. } => {
                        assert!(to > last, "offset must grow");
                        last = to;
                    }
                    TickOutcome::Stopped(event) => stops.push(event),
                    other => panic!("unexpected outcome {other:?}"),
                }
            }
            if !driver.is_running() {
                break;
            }
        }

        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].reason, StopReason::BoundaryReached);
        assert_eq!(stops[0].direction, ScrollDirection::Forward);
        assert!(!driver.is_running());
        assert!(driver.scheduler().pending().is_empty());
        assert!((495.0..=500.0).contains(&container.offset()));
    }

    #[test]
    fn pause_cancels_before_clearing_session() {
        let mut driver = driver(2, ScrollDirection::Forward);
        let container = SimulatedContainer::reliable(1000.0, 500.0);
        driver.start(Some(&container), true);
        let pending = driver.pending_frame().expect("first frame scheduled");

        assert!(driver.pause());
        assert!(!driver.is_running());
        assert_eq!(driver.scheduler().cancelled_count(), 1);
        assert!(driver.scheduler().pending().is_empty());

        let mut container = container;
        assert_eq!(driver.tick(pending, Some(&mut container), true), TickOutcome::Stale);
        assert_eq!(container.writes(), 0);
    }

    #[test]
    fn pause_then_start_never_overlaps_frames() {
        let mut driver = driver(4, ScrollDirection::Forward);
        let container = SimulatedContainer::reliable(1000.0, 500.0);

        for _ in 0..5 {
            driver.start(Some(&container), true);
            driver.pause();
            driver.start(Some(&container), true);
            driver.start(Some(&container), true);
            assert_eq!(driver.scheduler().pending().len(), 1);
        }
        assert_eq!(driver.scheduler().max_pending(), 1);
    }

    #[test]
    fn speed_change_while_running_rebuilds_session() {
        let mut driver = driver(2, ScrollDirection::Forward);
        let mut container = SimulatedContainer::reliable(1000.0, 500.0);
        driver.start(Some(&container), true);
        pump(&mut driver, &mut container);

        let restarted = driver.set_speed(SpeedLevel::new(9), Some(&container), true);
        assert!(matches!(restarted, Some(StartOutcome::Started { .. })));
        let session = driver.session().expect("still running");
        assert_eq!(session.speed(), SpeedLevel::new(9));
        assert_eq!(session.last_known_offset(), container.offset());
        assert_eq!(driver.scheduler().pending().len(), 1);

        assert_eq!(driver.set_speed(SpeedLevel::new(9), Some(&container), true), None);
    }

    #[test]
    fn speed_change_while_idle_does_not_start() {
        let mut driver = driver(2, ScrollDirection::Forward);
        let container = SimulatedContainer::reliable(1000.0, 500.0);
        assert_eq!(driver.set_speed(SpeedLevel::new(7), Some(&container), true), None);
        assert!(!driver.is_running());
        assert_eq!(driver.speed(), SpeedLevel::new(7));
    }

    /// Unmeasurable content whose offset ignores every write.
    struct FrozenContainer {
        offset: f64,
    }

    impl ScrollContainer for FrozenContainer {
        fn metrics(&self) -> ScrollMetrics {
            ScrollMetrics {
                offset: self.offset,
                scrollable_extent: 0.0,
                view_extent: 600.0,
            }
        }

        fn set_offset(&mut self, _offset: f64) {}
    }

    fn pump_frozen(
        driver: &mut ScrollDriver<ManualFrameScheduler>,
        container: &mut FrozenContainer,
    ) -> TickOutcome {
        let due = driver.scheduler_mut().take_due();
        assert_eq!(due.len(), 1, "exactly one frame should be pending");
        driver.tick(due[0], Some(container), true)
    }

    #[test]
    fn direction_change_resets_stall_count() {
        let mut driver = driver(5, ScrollDirection::Forward);
        let mut container = FrozenContainer { offset: 300.0 };
        driver.start(Some(&container), true);

        pump_frozen(&mut driver, &mut container);
        pump_frozen(&mut driver, &mut container);
        assert_eq!(driver.session().expect("running").stall_count(), 2);

        driver.set_direction(ScrollDirection::Backward, Some(&container), true);
        assert_eq!(driver.session().expect("restarted").stall_count(), 0);

        assert!(matches!(
            pump_frozen(&mut driver, &mut container),
            TickOutcome::Advanced { .. }
        ));
        assert!(matches!(
            pump_frozen(&mut driver, &mut container),
            TickOutcome::Advanced { .. }
        ));
        assert!(driver.is_running(), "two stalled frames must not stop the run");

        match pump_frozen(&mut driver, &mut container) {
            TickOutcome::Stopped(event) => {
                assert_eq!(event.reason, StopReason::DimensionUnreliableStall);
                assert_eq!(event.direction, ScrollDirection::Backward);
            }
            other => panic!("expected stop, got {other:?}"),
        }
    }

    #[test]
    fn detached_container_ends_run_without_writes() {
        let mut driver = driver(3, ScrollDirection::Forward);
        let container = SimulatedContainer::reliable(1000.0, 500.0);
        driver.start(Some(&container), true);
        let handle = driver.scheduler_mut().take_due()[0];

        assert_eq!(driver.tick::<SimulatedContainer>(handle, None, true), TickOutcome::Halted);
        assert!(!driver.is_running());
        assert!(driver.scheduler().pending().is_empty());
    }

    #[test]
    fn unloaded_content_ends_run_without_writes() {
        let mut driver = driver(3, ScrollDirection::Forward);
        let mut container = SimulatedContainer::reliable(1000.0, 500.0);
        driver.start(Some(&container), true);
        let handle = driver.scheduler_mut().take_due()[0];

        assert_eq!(driver.tick(handle, Some(&mut container), false), TickOutcome::Halted);
        assert_eq!(container.writes(), 0);
        assert!(!driver.is_running());
        assert!(driver.scheduler().pending().is_empty());
    }
}
