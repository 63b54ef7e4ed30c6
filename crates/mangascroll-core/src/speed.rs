//! Speed-level to per-frame distance mapping.
//!
//! The curve is piecewise linear: level 1 is a fixed crawl for careful reading,
//! and each following segment ramps more steeply so the top levels skim. Every
//! segment starts at the previous segment's endpoint, so crossing a boundary
//! never produces a visible jump in pace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lowest selectable speed level.
pub const MIN_SPEED_LEVEL: u8 = 1;
/// Highest selectable speed level.
pub const MAX_SPEED_LEVEL: u8 = 10;

/// Upper level of each ramp segment after level 1.
const SEGMENT_ENDS: [f64; 4] = [3.0, 5.0, 8.0, 10.0];

/// User-facing speed level, always inside `[MIN_SPEED_LEVEL, MAX_SPEED_LEVEL]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    /// Clamp any integer into the valid range. Out-of-range input is never rejected.
    pub fn new(level: i64) -> Self {
        let clamped = level.clamp(MIN_SPEED_LEVEL as i64, MAX_SPEED_LEVEL as i64);
        SpeedLevel(clamped as u8)
    }

    pub fn get(self) -> u8 {
        // Deserialized values bypass `new`, so clamp on read as well.
        self.0.clamp(MIN_SPEED_LEVEL, MAX_SPEED_LEVEL)
    }

    pub fn faster(self) -> Self {
        Self::new(self.get() as i64 + 1)
    }

    pub fn slower(self) -> Self {
        Self::new(self.get() as i64 - 1)
    }
}

impl Default for SpeedLevel {
    fn default() -> Self {
        SpeedLevel(MIN_SPEED_LEVEL)
    }
}

impl From<i64> for SpeedLevel {
    fn from(level: i64) -> Self {
        Self::new(level)
    }
}

impl std::fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Non-linear step curve. Distances are in the container's offset units per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedCurve {
    base_step: f64,
    slopes: [f64; 4],
}

impl Default for SpeedCurve {
    fn default() -> Self {
        SpeedCurve {
            base_step: 1.2,
            slopes: [0.4, 0.8, 1.6, 3.2],
        }
    }
}

impl SpeedCurve {
    /// Build a curve from a level-1 distance and the per-level slope of the
    /// segments ending at levels 3, 5, 8 and 10.
    ///
    /// Non-positive base steps fall back to the default crawl and negative
    /// slopes flatten to zero, which keeps the curve positive and monotonic.
    pub fn new(base_step: f64, slopes: [f64; 4]) -> Self {
        let fallback = SpeedCurve::default();
        let base_step = if base_step.is_finite() && base_step > 0.0 {
            base_step
        } else {
            fallback.base_step
        };
        let slopes = slopes.map(|slope| if slope.is_finite() { slope.max(0.0) } else { 0.0 });
        SpeedCurve { base_step, slopes }
    }

    pub fn step_for(&self, level: SpeedLevel) -> f64 {
        self.step_at(level.get() as f64)
    }

    /// Evaluate the curve at a continuous position in `[1, 10]`.
    fn step_at(&self, position: f64) -> f64 {
        let position = position.clamp(MIN_SPEED_LEVEL as f64, MAX_SPEED_LEVEL as f64);
        let mut step = self.base_step;
        let mut cursor = MIN_SPEED_LEVEL as f64;
        for (end, slope) in SEGMENT_ENDS.iter().zip(self.slopes) {
            if position <= cursor {
                break;
            }
            step += (position.min(*end) - cursor) * slope;
            cursor = *end;
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> impl Iterator<Item = SpeedLevel> {
        (MIN_SPEED_LEVEL..=MAX_SPEED_LEVEL).map(|level| SpeedLevel::new(level as i64))
    }

    #[test]
    fn steps_are_positive_and_non_decreasing() {
        let curve = SpeedCurve::default();
        let mut previous = 0.0;
        for level in levels() {
            let step = curve.step_for(level);
            assert!(step > 0.0, "level {level} produced {step}");
            assert!(step >= previous, "level {level} went backwards");
            previous = step;
        }
        assert!(curve.step_for(SpeedLevel::new(1)) < curve.step_for(SpeedLevel::new(10)));
    }

    #[test]
    fn matches_chosen_constants() {
        let curve = SpeedCurve::default();
        let expected = [1.2, 1.6, 2.0, 2.8, 3.6, 5.2, 6.8, 8.4, 11.6, 14.8];
        for (level, want) in levels().zip(expected) {
            let got = curve.step_for(level);
            assert!((got - want).abs() < 1e-9, "level {level}: {got} != {want}");
        }
    }

    #[test]
    fn segments_meet_at_boundaries() {
        let curve = SpeedCurve::default();
        for boundary in SEGMENT_ENDS {
            let below = curve.step_at(boundary - 1e-9);
            let at = curve.step_at(boundary);
            assert!((at - below).abs() < 1e-6, "jump at level {boundary}");
        }
    }

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(SpeedLevel::new(-4).get(), MIN_SPEED_LEVEL);
        assert_eq!(SpeedLevel::new(0).get(), MIN_SPEED_LEVEL);
        assert_eq!(SpeedLevel::new(99).get(), MAX_SPEED_LEVEL);
        assert_eq!(SpeedLevel::new(10).faster().get(), MAX_SPEED_LEVEL);
        assert_eq!(SpeedLevel::new(1).slower().get(), MIN_SPEED_LEVEL);
    }

    #[test]
    fn deserialized_level_is_clamped_on_read() {
        let level: SpeedLevel = serde_json::from_str("42").expect("level json");
        assert_eq!(level.get(), MAX_SPEED_LEVEL);
    }

    #[test]
    fn invalid_curve_parameters_stay_monotonic() {
        let curve = SpeedCurve::new(-1.0, [0.5, -2.0, f64::NAN, 1.0]);
        let mut previous = 0.0;
        for level in levels() {
            let step = curve.step_for(level);
            assert!(step > 0.0);
            assert!(step >= previous);
            previous = step;
        }
    }
}
