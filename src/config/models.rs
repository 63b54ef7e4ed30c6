use mangascroll_core::{
    DetectorConfig, EngineConfig, Keymap, LifecycleConfig, ScrollDirection, SpeedCurve, SpeedLevel,
};
use serde::Deserialize;
use std::time::Duration;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_bind_host")]
    pub bind_host: String,
    #[serde(default = "crate::config::defaults::default_port")]
    pub port: u16,
    #[serde(default = "crate::config::defaults::default_proxy_user_agent")]
    pub proxy_user_agent: String,
    #[serde(default = "crate::config::defaults::default_proxy_timeout_secs")]
    pub proxy_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_speed")]
    pub default_speed: u8,
    #[serde(default = "crate::config::defaults::default_direction")]
    pub default_direction: ScrollDirection,
    #[serde(default = "crate::config::defaults::default_chapter_pattern")]
    pub chapter_pattern: String,
    #[serde(default = "crate::config::defaults::default_end_epsilon")]
    pub end_epsilon: f64,
    #[serde(default = "crate::config::defaults::default_boundary_buffer")]
    pub boundary_buffer: f64,
    #[serde(default = "crate::config::defaults::default_stall_threshold")]
    pub stall_threshold: u32,
    #[serde(default = "crate::config::defaults::default_fallback_ceiling")]
    pub fallback_ceiling: f64,
    #[serde(default = "crate::config::defaults::default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_error_recovery_delay_ms")]
    pub error_recovery_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_load_watchdog_secs")]
    pub load_watchdog_secs: u64,
    #[serde(default = "crate::config::defaults::default_key_toggle_scroll")]
    pub key_toggle_scroll: String,
    #[serde(default = "crate::config::defaults::default_key_speed_up")]
    pub key_speed_up: String,
    #[serde(default = "crate::config::defaults::default_key_speed_down")]
    pub key_speed_down: String,
    #[serde(default = "crate::config::defaults::default_key_toggle_direction")]
    pub key_toggle_direction: String,
    #[serde(default = "crate::config::defaults::default_key_next_chapter")]
    pub key_next_chapter: String,
    #[serde(default = "crate::config::defaults::default_key_prev_chapter")]
    pub key_prev_chapter: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_host: crate::config::defaults::default_bind_host(),
            port: crate::config::defaults::default_port(),
            proxy_user_agent: crate::config::defaults::default_proxy_user_agent(),
            proxy_timeout_secs: crate::config::defaults::default_proxy_timeout_secs(),
            default_speed: crate::config::defaults::default_speed(),
            default_direction: crate::config::defaults::default_direction(),
            chapter_pattern: crate::config::defaults::default_chapter_pattern(),
            end_epsilon: crate::config::defaults::default_end_epsilon(),
            boundary_buffer: crate::config::defaults::default_boundary_buffer(),
            stall_threshold: crate::config::defaults::default_stall_threshold(),
            fallback_ceiling: crate::config::defaults::default_fallback_ceiling(),
            settle_delay_ms: crate::config::defaults::default_settle_delay_ms(),
            error_recovery_delay_ms: crate::config::defaults::default_error_recovery_delay_ms(),
            load_watchdog_secs: crate::config::defaults::default_load_watchdog_secs(),
            key_toggle_scroll: crate::config::defaults::default_key_toggle_scroll(),
            key_speed_up: crate::config::defaults::default_key_speed_up(),
            key_speed_down: crate::config::defaults::default_key_speed_down(),
            key_toggle_direction: crate::config::defaults::default_key_toggle_direction(),
            key_next_chapter: crate::config::defaults::default_key_next_chapter(),
            key_prev_chapter: crate::config::defaults::default_key_prev_chapter(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host.trim(), self.port)
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs.clamp(1, 300))
    }

    /// Engine settings; the core clamps anything out of range.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            detector: DetectorConfig {
                epsilon: self.end_epsilon,
                boundary_buffer: self.boundary_buffer,
                stall_threshold: self.stall_threshold,
                fallback_ceiling: self.fallback_ceiling,
            },
            lifecycle: LifecycleConfig {
                settle_delay: Duration::from_millis(self.settle_delay_ms),
                error_recovery_delay: Duration::from_millis(self.error_recovery_delay_ms),
                load_watchdog: Duration::from_secs(self.load_watchdog_secs.max(1)),
            },
            curve: SpeedCurve::default(),
            default_speed: SpeedLevel::new(self.default_speed as i64),
            default_direction: self.default_direction,
            chapter_pattern: self.chapter_pattern.clone(),
            keymap: Keymap {
                toggle_scroll: self.key_toggle_scroll.clone(),
                speed_up: self.key_speed_up.clone(),
                speed_down: self.key_speed_down.clone(),
                toggle_direction: self.key_toggle_direction.clone(),
                next_chapter: self.key_next_chapter.clone(),
                prev_chapter: self.key_prev_chapter.clone(),
            },
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_carries_tunables() {
        let config = AppConfig {
            stall_threshold: 4,
            default_speed: 12,
            settle_delay_ms: 50,
            default_direction: ScrollDirection::Backward,
            ..AppConfig::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.detector.stall_threshold, 4);
        assert_eq!(engine.default_speed, SpeedLevel::new(10));
        assert_eq!(engine.lifecycle.settle_delay, Duration::from_millis(50));
        assert_eq!(engine.default_direction, ScrollDirection::Backward);
        assert_eq!(engine.keymap, Keymap::default());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        assert_eq!(AppConfig::default().bind_addr(), "127.0.0.1:3000");
    }
}
