//! End-of-content detection.
//!
//! Embedded cross-origin pages often report a scrollable height equal to the
//! viewport (or zero), so the reported range cannot always be trusted. The
//! detector classifies every frame into one of two paths:
//!
//! - `Reliable`: the reported range is usable and the boundary is a plain
//!   comparison against it.
//! - `Unreliable`: the range is substituted with a large ceiling and the end is
//!   inferred from the driver's own writes no longer moving the offset.

use crate::container::ScrollMetrics;
use crate::session::{ScrollDirection, ScrollSession, same_offset, sanitize};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ts_rs::TS;

/// Tunables for the detector. These were tuned against real sites rather than
/// derived, so they stay configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// A reported range at or below this is treated as unmeasurable.
    pub epsilon: f64,
    /// Rounding slack when comparing against a reliable boundary.
    pub boundary_buffer: f64,
    /// Consecutive motionless frames that count as the end on the unreliable path.
    pub stall_threshold: u32,
    /// Range substituted for an unmeasurable one.
    pub fallback_ceiling: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            epsilon: 10.0,
            boundary_buffer: 5.0,
            stall_threshold: 3,
            fallback_ceiling: 10_000.0,
        }
    }
}

impl DetectorConfig {
    /// Clamp values into ranges the heuristics can work with.
    pub fn sanitized(self) -> Self {
        let fallback = DetectorConfig::default();
        let non_negative = |value: f64, default: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                default
            }
        };
        let epsilon = non_negative(self.epsilon, fallback.epsilon);
        let ceiling = non_negative(self.fallback_ceiling, fallback.fallback_ceiling);
        DetectorConfig {
            epsilon,
            boundary_buffer: non_negative(self.boundary_buffer, fallback.boundary_buffer),
            stall_threshold: self.stall_threshold.max(1),
            fallback_ceiling: ceiling.max(epsilon + 1.0),
        }
    }
}

/// Why a run was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StopReason {
    BoundaryReached,
    DimensionUnreliableStall,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StopReason::BoundaryReached => "boundary-reached",
            StopReason::DimensionUnreliableStall => "dimension-unreliable-stall",
        };
        write!(f, "{}", label)
    }
}

/// Which measurement path a frame was judged on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimensionPath {
    Reliable { limit: f64 },
    Unreliable { ceiling: f64 },
}

impl DimensionPath {
    /// Range the driver should assume it can scroll through.
    pub fn effective_limit(self) -> f64 {
        match self {
            DimensionPath::Reliable { limit } => limit,
            DimensionPath::Unreliable { ceiling } => ceiling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    Continue { path: DimensionPath },
    Stop { path: DimensionPath, reason: StopReason },
}

impl Detection {
    pub fn should_stop(&self) -> bool {
        matches!(self, Detection::Stop { .. })
    }

    pub fn reason(&self) -> Option<StopReason> {
        match self {
            Detection::Continue { .. } => None,
            Detection::Stop { reason, .. } => Some(*reason),
        }
    }

    pub fn path(&self) -> DimensionPath {
        match self {
            Detection::Continue { path } | Detection::Stop { path, .. } => *path,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EndDetector {
    config: DetectorConfig,
}

impl EndDetector {
    pub fn new(config: DetectorConfig) -> Self {
        EndDetector {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    pub fn classify(&self, metrics: &ScrollMetrics) -> DimensionPath {
        let limit = sanitize(metrics.limit());
        if limit > self.config.epsilon {
            DimensionPath::Reliable { limit }
        } else {
            DimensionPath::Unreliable {
                ceiling: self.config.fallback_ceiling,
            }
        }
    }

    /// Judge one frame. Always records the observed offset into the session.
    pub fn should_stop(
        &self,
        metrics: &ScrollMetrics,
        direction: ScrollDirection,
        session: &mut ScrollSession,
    ) -> Detection {
        let offset = sanitize(metrics.offset);
        let path = self.classify(metrics);
        let detection = match path {
            DimensionPath::Reliable { limit } => self.judge_reliable(offset, limit, direction),
            DimensionPath::Unreliable { ceiling } => {
                self.judge_unreliable(offset, ceiling, direction, session)
            }
        };

        // A stalled frame has an unchanged offset, so recording keeps its count.
        session.record_offset(offset);

        match detection {
            None => Detection::Continue { path },
            Some(reason) => {
                debug!(%direction, %reason, offset, "End of content detected");
                Detection::Stop { path, reason }
            }
        }
    }

    fn judge_reliable(
        &self,
        offset: f64,
        limit: f64,
        direction: ScrollDirection,
    ) -> Option<StopReason> {
        let buffer = self.config.boundary_buffer;
        let reached = match direction {
            ScrollDirection::Forward => offset >= limit - buffer,
            ScrollDirection::Backward => offset <= buffer,
        };
        trace!(offset, limit, reached, "Reliable boundary check");
        reached.then_some(StopReason::BoundaryReached)
    }

    fn judge_unreliable(
        &self,
        offset: f64,
        ceiling: f64,
        direction: ScrollDirection,
        session: &mut ScrollSession,
    ) -> Option<StopReason> {
        let unchanged = same_offset(offset, session.last_known_offset());
        let stalled = match direction {
            ScrollDirection::Forward => offset > 0.0 && unchanged,
            ScrollDirection::Backward => unchanged && offset < ceiling,
        };

        if !stalled {
            session.clear_stalls();
            return None;
        }

        let stalls = session.register_stall();
        trace!(offset, stalls, "Offset did not move on unmeasurable content");
        (stalls >= self.config.stall_threshold).then_some(StopReason::DimensionUnreliableStall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speed::SpeedLevel;

    fn metrics(offset: f64, scrollable_extent: f64, view_extent: f64) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            scrollable_extent,
            view_extent,
        }
    }

    fn session(direction: ScrollDirection, offset: f64) -> ScrollSession {
        ScrollSession::new(direction, SpeedLevel::new(5), offset)
    }

    #[test]
    fn classifies_small_ranges_as_unreliable() {
        let detector = EndDetector::default();
        assert_eq!(
            detector.classify(&metrics(0.0, 510.0, 500.0)),
            DimensionPath::Unreliable { ceiling: 10_000.0 }
        );
        assert_eq!(
            detector.classify(&metrics(0.0, 0.0, 500.0)),
            DimensionPath::Unreliable { ceiling: 10_000.0 }
        );
        assert_eq!(
            detector.classify(&metrics(0.0, 511.0, 500.0)),
            DimensionPath::Reliable { limit: 11.0 }
        );
    }

    #[test]
    fn reliable_forward_stops_inside_buffer() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Forward, 0.0);

        let before = detector.should_stop(
            &metrics(494.0, 1000.0, 500.0),
            ScrollDirection::Forward,
            &mut run,
        );
        assert!(!before.should_stop());

        let at = detector.should_stop(
            &metrics(495.0, 1000.0, 500.0),
            ScrollDirection::Forward,
            &mut run,
        );
        assert_eq!(at.reason(), Some(StopReason::BoundaryReached));
        assert_eq!(at.path(), DimensionPath::Reliable { limit: 500.0 });
    }

    #[test]
    fn reliable_backward_stops_near_top() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Backward, 500.0);

        let moving = detector.should_stop(
            &metrics(6.0, 1000.0, 500.0),
            ScrollDirection::Backward,
            &mut run,
        );
        assert!(!moving.should_stop());

        let top = detector.should_stop(
            &metrics(5.0, 1000.0, 500.0),
            ScrollDirection::Backward,
            &mut run,
        );
        assert_eq!(top.reason(), Some(StopReason::BoundaryReached));
    }

    #[test]
    fn unreliable_forward_needs_three_stalled_frames() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Forward, 320.0);
        let frame = metrics(320.0, 0.0, 600.0);

        assert!(!detector.should_stop(&frame, ScrollDirection::Forward, &mut run).should_stop());
        assert!(!detector.should_stop(&frame, ScrollDirection::Forward, &mut run).should_stop());
        assert_eq!(run.stall_count(), 2);

        let third = detector.should_stop(&frame, ScrollDirection::Forward, &mut run);
        assert_eq!(third.reason(), Some(StopReason::DimensionUnreliableStall));
    }

    #[test]
    fn unreliable_movement_resets_stalls() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Forward, 100.0);

        detector.should_stop(&metrics(100.0, 0.0, 600.0), ScrollDirection::Forward, &mut run);
        detector.should_stop(&metrics(100.0, 0.0, 600.0), ScrollDirection::Forward, &mut run);
        assert_eq!(run.stall_count(), 2);

        detector.should_stop(&metrics(104.0, 0.0, 600.0), ScrollDirection::Forward, &mut run);
        assert_eq!(run.stall_count(), 0);
        assert_eq!(run.last_known_offset(), 104.0);
    }

    #[test]
    fn unreliable_forward_at_origin_never_stalls() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Forward, 0.0);
        for _ in 0..5 {
            let detection =
                detector.should_stop(&metrics(0.0, 0.0, 600.0), ScrollDirection::Forward, &mut run);
            assert!(!detection.should_stop());
        }
        assert_eq!(run.stall_count(), 0);
    }

    #[test]
    fn unreliable_backward_stalls_at_top() {
        let detector = EndDetector::default();
        let mut run = session(ScrollDirection::Backward, 0.0);
        let frame = metrics(0.0, 0.0, 600.0);

        detector.should_stop(&frame, ScrollDirection::Backward, &mut run);
        detector.should_stop(&frame, ScrollDirection::Backward, &mut run);
        let third = detector.should_stop(&frame, ScrollDirection::Backward, &mut run);
        assert_eq!(third.reason(), Some(StopReason::DimensionUnreliableStall));
    }

    #[test]
    fn stall_threshold_is_configurable() {
        let detector = EndDetector::new(DetectorConfig {
            stall_threshold: 5,
            ..DetectorConfig::default()
        });
        let mut run = session(ScrollDirection::Forward, 50.0);
        let frame = metrics(50.0, 0.0, 600.0);
        for _ in 0..4 {
            let detection = detector.should_stop(&frame, ScrollDirection::Forward, &mut run);
            assert!(!detection.should_stop());
        }
        assert!(detector.should_stop(&frame, ScrollDirection::Forward, &mut run).should_stop());
    }

    #[test]
    fn sanitized_config_keeps_threshold_positive() {
        let config = DetectorConfig {
            epsilon: -1.0,
            boundary_buffer: f64::NAN,
            stall_threshold: 0,
            fallback_ceiling: 2.0,
        }
        .sanitized();
        assert_eq!(config.epsilon, 10.0);
        assert_eq!(config.boundary_buffer, 5.0);
        assert_eq!(config.stall_threshold, 1);
        assert_eq!(config.fallback_ceiling, 11.0);
    }
}
