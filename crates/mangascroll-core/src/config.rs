use crate::detector::DetectorConfig;
use crate::lifecycle::LifecycleConfig;
use crate::navigation::DEFAULT_CHAPTER_PATTERN;
use crate::session::ScrollDirection;
use crate::shortcuts::Keymap;
use crate::speed::{SpeedCurve, SpeedLevel};

/// Everything a [`ReaderSession`](crate::reader::ReaderSession) needs at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub detector: DetectorConfig,
    pub lifecycle: LifecycleConfig,
    pub curve: SpeedCurve,
    pub default_speed: SpeedLevel,
    pub default_direction: ScrollDirection,
    pub chapter_pattern: String,
    pub keymap: Keymap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            detector: DetectorConfig::default(),
            lifecycle: LifecycleConfig::default(),
            curve: SpeedCurve::default(),
            default_speed: SpeedLevel::default(),
            default_direction: ScrollDirection::default(),
            chapter_pattern: DEFAULT_CHAPTER_PATTERN.to_string(),
            keymap: Keymap::default(),
        }
    }
}
