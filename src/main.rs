//! Entry point for the manga auto-scroll reader.
//!
//! - `serve` (default) hosts the same-origin proxy and the manga API.
//! - `read <url>` runs the scroll engine headlessly against a simulated page.
//! - `config` prints the effective configuration in the sectioned layout.

mod cache;
mod cancellation;
mod config;
mod http;
mod manga_api;
mod proxy;
mod server;
mod simulate;

use crate::cancellation::CancellationToken;
use crate::config::{AppConfig, load_config, serialize_config};
use crate::simulate::{ReadOptions, run_read};
use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const CONFIG_PATH: &str = "conf/config.toml";

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let config = load_config(Path::new(CONFIG_PATH));
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "serve".to_string());
    let cancel = install_interrupt_handler()?;

    match command.as_str() {
        "serve" => {
            if let Some(extra) = args.next() {
                return Err(anyhow!("Unexpected argument for serve: {extra}"));
            }
            log_startup(&config, "serve");
            server::serve(&config, &cancel)
        }
        "read" => {
            let options = ReadOptions::parse(args)?;
            log_startup(&config, "read");
            let summary = run_read(&config, &options, &cancel)?;
            match summary.stop {
                Some(stop) => info!(
                    reason = ?stop.reason,
                    offset = stop.offset,
                    "Reached the end of the chapter"
                ),
                None => warn!(offset = summary.offset, "Stopped before the end of the chapter"),
            }
            Ok(())
        }
        "config" => {
            print!("{}", serialize_config(&config)?);
            Ok(())
        }
        other => Err(anyhow!(
            "Unknown command `{other}`. Usage: mangascroll [serve | read <url> [flags] | config]"
        )),
    }
}

fn log_startup(config: &AppConfig, command: &str) {
    info!(
        command,
        level = %config.log_level,
        addr = %config.bind_addr(),
        speed = config.default_speed,
        direction = %config.default_direction,
        "Starting manga reader"
    );
}

fn install_interrupt_handler() -> Result<CancellationToken> {
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received; shutting down");
        handler_token.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(cancel)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
