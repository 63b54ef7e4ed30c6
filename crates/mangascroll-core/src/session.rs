use crate::speed::SpeedLevel;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Reading direction of an auto-scroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScrollDirection {
    #[serde(rename = "down")]
    Forward,
    #[serde(rename = "up")]
    Backward,
}

impl Default for ScrollDirection {
    fn default() -> Self {
        ScrollDirection::Forward
    }
}

impl ScrollDirection {
    pub fn toggled(self) -> Self {
        match self {
            ScrollDirection::Forward => ScrollDirection::Backward,
            ScrollDirection::Backward => ScrollDirection::Forward,
        }
    }

    /// Sign applied to a step when moving in this direction.
    pub fn sign(self) -> f64 {
        match self {
            ScrollDirection::Forward => 1.0,
            ScrollDirection::Backward => -1.0,
        }
    }
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScrollDirection::Forward => "down",
            ScrollDirection::Backward => "up",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for ScrollDirection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "down" | "forward" => Ok(ScrollDirection::Forward),
            "up" | "backward" => Ok(ScrollDirection::Backward),
            other => Err(format!("unknown scroll direction `{other}`")),
        }
    }
}

/// Live state of one auto-scroll run.
///
/// A session is never mutated across a restart: speed and direction changes
/// build a fresh one so stall tracking always starts clean. While a session
/// exists the driver considers itself running.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSession {
    direction: ScrollDirection,
    speed: SpeedLevel,
    last_known_offset: f64,
    stall_count: u32,
}

impl ScrollSession {
    pub fn new(direction: ScrollDirection, speed: SpeedLevel, offset: f64) -> Self {
        ScrollSession {
            direction,
            speed,
            last_known_offset: sanitize(offset),
            stall_count: 0,
        }
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn speed(&self) -> SpeedLevel {
        self.speed
    }

    pub fn last_known_offset(&self) -> f64 {
        self.last_known_offset
    }

    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    pub(crate) fn register_stall(&mut self) -> u32 {
        self.stall_count = self.stall_count.saturating_add(1);
        self.stall_count
    }

    pub(crate) fn clear_stalls(&mut self) {
        self.stall_count = 0;
    }

    /// Remember the offset seen this frame. A changed offset always clears the
    /// stall counter.
    pub(crate) fn record_offset(&mut self, offset: f64) {
        let offset = sanitize(offset);
        if !same_offset(offset, self.last_known_offset) {
            self.stall_count = 0;
        }
        self.last_known_offset = offset;
    }
}

/// Offsets reported by scroll containers are compared with a tiny tolerance so
/// float noise does not count as movement.
pub(crate) fn same_offset(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

pub(crate) fn sanitize(offset: f64) -> f64 {
    if offset.is_finite() { offset } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_reading_labels() {
        assert_eq!("down".parse::<ScrollDirection>(), Ok(ScrollDirection::Forward));
        assert_eq!(" UP ".parse::<ScrollDirection>(), Ok(ScrollDirection::Backward));
        assert!("sideways".parse::<ScrollDirection>().is_err());
    }

    #[test]
    fn direction_serializes_as_reading_labels() {
        let json = serde_json::to_string(&ScrollDirection::Backward).expect("direction json");
        assert_eq!(json, "\"up\"");
    }

    #[test]
    fn recording_a_new_offset_clears_stalls() {
        let mut session = ScrollSession::new(ScrollDirection::Forward, SpeedLevel::new(3), 10.0);
        session.register_stall();
        session.register_stall();
        session.record_offset(10.0);
        assert_eq!(session.stall_count(), 2);
        session.record_offset(14.0);
        assert_eq!(session.stall_count(), 0);
        assert_eq!(session.last_known_offset(), 14.0);
    }

    #[test]
    fn non_finite_offsets_are_sanitized() {
        let session = ScrollSession::new(ScrollDirection::Forward, SpeedLevel::new(1), f64::NAN);
        assert_eq!(session.last_known_offset(), 0.0);
    }
}
