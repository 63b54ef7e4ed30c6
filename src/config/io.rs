use super::models::AppConfig;
use super::tables::{ConfigTables, SECTION_KEYS};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load `path`, falling back to defaults when the file is missing or invalid.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

/// Parse either the sectioned layout or the flat one.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let table: toml::Table = toml::from_str(contents).context("config is not valid TOML")?;
    let sectioned = SECTION_KEYS
        .iter()
        .any(|key| table.get(*key).is_some_and(toml::Value::is_table));

    if sectioned {
        let tables: ConfigTables =
            toml::from_str(contents).context("failed to read sectioned config")?;
        Ok(tables.into())
    } else {
        toml::from_str::<AppConfig>(contents).context("failed to read flat config")
    }
}

/// Serialize using the sectioned layout.
pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string(&ConfigTables::from(config)).context("failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use mangascroll_core::ScrollDirection;

    #[test]
    fn parses_sectioned_layout() {
        let config = parse_config(
            r#"
[server]
port = 8080

[reading]
default_direction = "up"
chapter_pattern = "ep-{n}"

[scroll]
stall_threshold = 5

[logging]
log_level = "info"
"#,
        )
        .expect("sectioned config");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_host, "127.0.0.1");
        assert_eq!(config.default_direction, ScrollDirection::Backward);
        assert_eq!(config.chapter_pattern, "ep-{n}");
        assert_eq!(config.stall_threshold, 5);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.key_toggle_scroll, "space");
    }

    #[test]
    fn parses_flat_layout() {
        let config = parse_config("port = 4000\ndefault_speed = 7\n").expect("flat config");
        assert_eq!(config.port, 4000);
        assert_eq!(config.default_speed, 7);
        assert_eq!(config.settle_delay_ms, 300);
    }

    #[test]
    fn serialized_config_round_trips() {
        let config = AppConfig {
            port: 9000,
            boundary_buffer: 8.0,
            ..AppConfig::default()
        };
        let text = serialize_config(&config).expect("serialize");
        assert!(text.contains("[server]"));
        assert_eq!(parse_config(&text).expect("parse"), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("does/not/exist.toml"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("port = [").is_err());
    }
}
