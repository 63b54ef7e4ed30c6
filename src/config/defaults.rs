use mangascroll_core::ScrollDirection;

pub(crate) fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_port() -> u16 {
    3000
}

pub(crate) fn default_proxy_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

pub(crate) fn default_proxy_timeout_secs() -> u64 {
    20
}

pub(crate) fn default_speed() -> u8 {
    1
}

pub(crate) fn default_direction() -> ScrollDirection {
    ScrollDirection::Forward
}

pub(crate) fn default_chapter_pattern() -> String {
    mangascroll_core::navigation::DEFAULT_CHAPTER_PATTERN.to_string()
}

pub(crate) fn default_end_epsilon() -> f64 {
    10.0
}

pub(crate) fn default_boundary_buffer() -> f64 {
    5.0
}

pub(crate) fn default_stall_threshold() -> u32 {
    3
}

pub(crate) fn default_fallback_ceiling() -> f64 {
    10_000.0
}

pub(crate) fn default_settle_delay_ms() -> u64 {
    300
}

pub(crate) fn default_error_recovery_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_load_watchdog_secs() -> u64 {
    15
}

pub(crate) fn default_key_toggle_scroll() -> String {
    "space".to_string()
}

pub(crate) fn default_key_speed_up() -> String {
    "shift+arrowup".to_string()
}

pub(crate) fn default_key_speed_down() -> String {
    "shift+arrowdown".to_string()
}

pub(crate) fn default_key_toggle_direction() -> String {
    "d".to_string()
}

pub(crate) fn default_key_next_chapter() -> String {
    "n".to_string()
}

pub(crate) fn default_key_prev_chapter() -> String {
    "p".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
