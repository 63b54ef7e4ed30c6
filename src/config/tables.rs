use super::defaults;
use super::models::{AppConfig, LogLevel};
use mangascroll_core::ScrollDirection;
use serde::Deserialize;

/// Section names that mark a file as using the sectioned layout.
pub(super) const SECTION_KEYS: [&str; 6] =
    ["server", "reading", "scroll", "loading", "keys", "logging"];

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    scroll: ScrollConfig,
    #[serde(default)]
    loading: LoadingConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            bind_host: tables.server.bind_host,
            port: tables.server.port,
            proxy_user_agent: tables.server.proxy_user_agent,
            proxy_timeout_secs: tables.server.proxy_timeout_secs,
            default_speed: tables.reading.default_speed,
            default_direction: tables.reading.default_direction,
            chapter_pattern: tables.reading.chapter_pattern,
            end_epsilon: tables.scroll.end_epsilon,
            boundary_buffer: tables.scroll.boundary_buffer,
            stall_threshold: tables.scroll.stall_threshold,
            fallback_ceiling: tables.scroll.fallback_ceiling,
            settle_delay_ms: tables.loading.settle_delay_ms,
            error_recovery_delay_ms: tables.loading.error_recovery_delay_ms,
            load_watchdog_secs: tables.loading.load_watchdog_secs,
            key_toggle_scroll: tables.keys.key_toggle_scroll,
            key_speed_up: tables.keys.key_speed_up,
            key_speed_down: tables.keys.key_speed_down,
            key_toggle_direction: tables.keys.key_toggle_direction,
            key_next_chapter: tables.keys.key_next_chapter,
            key_prev_chapter: tables.keys.key_prev_chapter,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            server: ServerConfig {
                bind_host: config.bind_host.clone(),
                port: config.port,
                proxy_user_agent: config.proxy_user_agent.clone(),
                proxy_timeout_secs: config.proxy_timeout_secs,
            },
            reading: ReadingConfig {
                default_speed: config.default_speed,
                default_direction: config.default_direction,
                chapter_pattern: config.chapter_pattern.clone(),
            },
            scroll: ScrollConfig {
                end_epsilon: config.end_epsilon,
                boundary_buffer: config.boundary_buffer,
                stall_threshold: config.stall_threshold,
                fallback_ceiling: config.fallback_ceiling,
            },
            loading: LoadingConfig {
                settle_delay_ms: config.settle_delay_ms,
                error_recovery_delay_ms: config.error_recovery_delay_ms,
                load_watchdog_secs: config.load_watchdog_secs,
            },
            keys: KeysConfig {
                key_toggle_scroll: config.key_toggle_scroll.clone(),
                key_speed_up: config.key_speed_up.clone(),
                key_speed_down: config.key_speed_down.clone(),
                key_toggle_direction: config.key_toggle_direction.clone(),
                key_next_chapter: config.key_next_chapter.clone(),
                key_prev_chapter: config.key_prev_chapter.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ServerConfig {
    #[serde(default = "defaults::default_bind_host")]
    bind_host: String,
    #[serde(default = "defaults::default_port")]
    port: u16,
    #[serde(default = "defaults::default_proxy_user_agent")]
    proxy_user_agent: String,
    #[serde(default = "defaults::default_proxy_timeout_secs")]
    proxy_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_host: defaults::default_bind_host(),
            port: defaults::default_port(),
            proxy_user_agent: defaults::default_proxy_user_agent(),
            proxy_timeout_secs: defaults::default_proxy_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_speed")]
    default_speed: u8,
    #[serde(default = "defaults::default_direction")]
    default_direction: ScrollDirection,
    #[serde(default = "defaults::default_chapter_pattern")]
    chapter_pattern: String,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            default_speed: defaults::default_speed(),
            default_direction: defaults::default_direction(),
            chapter_pattern: defaults::default_chapter_pattern(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ScrollConfig {
    #[serde(default = "defaults::default_end_epsilon")]
    end_epsilon: f64,
    #[serde(default = "defaults::default_boundary_buffer")]
    boundary_buffer: f64,
    #[serde(default = "defaults::default_stall_threshold")]
    stall_threshold: u32,
    #[serde(default = "defaults::default_fallback_ceiling")]
    fallback_ceiling: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            end_epsilon: defaults::default_end_epsilon(),
            boundary_buffer: defaults::default_boundary_buffer(),
            stall_threshold: defaults::default_stall_threshold(),
            fallback_ceiling: defaults::default_fallback_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoadingConfig {
    #[serde(default = "defaults::default_settle_delay_ms")]
    settle_delay_ms: u64,
    #[serde(default = "defaults::default_error_recovery_delay_ms")]
    error_recovery_delay_ms: u64,
    #[serde(default = "defaults::default_load_watchdog_secs")]
    load_watchdog_secs: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        LoadingConfig {
            settle_delay_ms: defaults::default_settle_delay_ms(),
            error_recovery_delay_ms: defaults::default_error_recovery_delay_ms(),
            load_watchdog_secs: defaults::default_load_watchdog_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_scroll")]
    key_toggle_scroll: String,
    #[serde(default = "defaults::default_key_speed_up")]
    key_speed_up: String,
    #[serde(default = "defaults::default_key_speed_down")]
    key_speed_down: String,
    #[serde(default = "defaults::default_key_toggle_direction")]
    key_toggle_direction: String,
    #[serde(default = "defaults::default_key_next_chapter")]
    key_next_chapter: String,
    #[serde(default = "defaults::default_key_prev_chapter")]
    key_prev_chapter: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            key_toggle_scroll: defaults::default_key_toggle_scroll(),
            key_speed_up: defaults::default_key_speed_up(),
            key_speed_down: defaults::default_key_speed_down(),
            key_toggle_direction: defaults::default_key_toggle_direction(),
            key_next_chapter: defaults::default_key_next_chapter(),
            key_prev_chapter: defaults::default_key_prev_chapter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
