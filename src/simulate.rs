//! Headless reader: drives the engine against a simulated page.
//!
//! Time is virtual. Each frame advances the clock by `frame_ms`, so a run
//! finishes as fast as the engine can tick.

use crate::cache::{load_last_url, save_last_url};
use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::manga_api;
use crate::proxy::{ProxyClient, Upstream, UpstreamMethod, UpstreamRequest};
use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use mangascroll_core::{
    BoundaryEvent, ManualFrameScheduler, NoticeVariant, ReaderSession, ScrollDirection,
    SimulatedContainer, SpeedLevel, StartOutcome,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub url: Option<String>,
    pub extent: f64,
    pub view: f64,
    pub speed: Option<i64>,
    pub direction: Option<ScrollDirection>,
    pub unreliable: bool,
    pub fetch: bool,
    pub max_frames: usize,
    pub frame_ms: u64,
    pub cache_dir: PathBuf,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            url: None,
            extent: 4000.0,
            view: 800.0,
            speed: None,
            direction: None,
            unreliable: false,
            fetch: false,
            max_frames: 20_000,
            frame_ms: 16,
            cache_dir: PathBuf::from(crate::cache::CACHE_DIR),
        }
    }
}

impl ReadOptions {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = ReadOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--extent" => options.extent = parse_value(&mut args, "--extent")?,
                "--view" => options.view = parse_value(&mut args, "--view")?,
                "--speed" => options.speed = Some(parse_value(&mut args, "--speed")?),
                "--direction" => {
                    let raw: String = parse_value(&mut args, "--direction")?;
                    let direction = raw.parse::<ScrollDirection>().map_err(|err| anyhow!(err))?;
                    options.direction = Some(direction);
                }
                "--unreliable" => options.unreliable = true,
                "--fetch" => options.fetch = true,
                "--max-frames" => options.max_frames = parse_value(&mut args, "--max-frames")?,
                "--frame-ms" => options.frame_ms = parse_value(&mut args, "--frame-ms")?,
                flag if flag.starts_with("--") => bail!("Unknown flag: {flag}"),
                url if options.url.is_none() => options.url = Some(url.to_string()),
                extra => bail!("Unexpected argument: {extra}"),
            }
        }
        Ok(options)
    }
}

fn parse_value<T, I>(args: &mut I, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    I: Iterator<Item = String>,
{
    let raw = args.next().ok_or_else(|| anyhow!("{flag} needs a value"))?;
    raw.parse::<T>()
        .map_err(|err| anyhow!("invalid value for {flag}: {raw} ({err})"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadSummary {
    pub url: String,
    pub frames: usize,
    pub offset: f64,
    pub stop: Option<BoundaryEvent>,
    pub title: Option<String>,
}

pub fn run_read(
    config: &AppConfig,
    options: &ReadOptions,
    cancel: &CancellationToken,
) -> Result<ReadSummary> {
    let url = options
        .url
        .clone()
        .or_else(|| load_last_url(&options.cache_dir))
        .ok_or_else(|| anyhow!("Usage: mangascroll read <url> [flags]"))?;

    let mut engine = config.engine_config();
    if let Some(speed) = options.speed {
        engine.default_speed = SpeedLevel::new(speed);
    }
    if let Some(direction) = options.direction {
        engine.default_direction = direction;
    }

    let container = if options.unreliable {
        SimulatedContainer::unreliable(options.extent, options.view)
    } else {
        SimulatedContainer::reliable(options.extent, options.view)
    };
    let mut session = ReaderSession::new(engine, ManualFrameScheduler::new());
    session.attach_container(container);

    session.on_notice(|notice| match notice.variant {
        NoticeVariant::Destructive => warn!(title = %notice.title, "{}", notice.description),
        _ => info!(title = %notice.title, "{}", notice.description),
    });
    let stop = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&stop);
    session.on_boundary_reached(move |event| *sink.borrow_mut() = Some(*event));

    let mut now = Instant::now();
    session.load_url(&url, now);
    save_last_url(&options.cache_dir, &url);
    session.set_chapter_info(manga_api::chapter_info(&url, Utc::now()));

    if options.fetch {
        let client = ProxyClient::new(&config.proxy_user_agent, config.proxy_timeout())?;
        match fetch_status(&client, &url) {
            Ok(status) if status < 400 => session.frame_loaded(now),
            Ok(status) => session.frame_failed(&format!("status {status}"), now),
            Err(err) => session.frame_failed(&format!("{err:#}"), now),
        }
    } else {
        session.frame_loaded(now);
    }

    while !session.is_loaded() {
        let deadline = session
            .next_deadline()
            .context("content never became ready")?;
        now = now.max(deadline);
        session.poll(now);
    }

    if let StartOutcome::Rejected(reason) = session.start() {
        bail!("auto-scroll could not start: {reason:?}");
    }

    let frame = Duration::from_millis(options.frame_ms.max(1));
    let mut frames = 0;
    while frames < options.max_frames && session.is_running() {
        if cancel.is_cancelled() {
            info!("Read cancelled");
            session.pause();
            break;
        }
        now += frame;
        session.poll(now);
        session.run_frame();
        frames += 1;
    }
    if session.is_running() {
        warn!(frames, "Frame budget exhausted before reaching the boundary");
        session.pause();
    }

    let snapshot = session.snapshot();
    let summary = ReadSummary {
        url,
        frames,
        offset: snapshot.offset.unwrap_or_default(),
        stop: *stop.borrow(),
        title: snapshot.chapter_info.as_ref().map(|info| info.title.clone()),
    };
    debug!(?snapshot, "Final reader state");
    info!(
        frames = summary.frames,
        offset = summary.offset,
        stopped = summary.stop.is_some(),
        "Headless read finished"
    );
    Ok(summary)
}

fn fetch_status(upstream: &dyn Upstream, url: &str) -> Result<u16> {
    let response = upstream.send(&UpstreamRequest {
        method: UpstreamMethod::Get,
        url: url.to_string(),
        content_type: None,
        body: Vec::new(),
    })?;
    Ok(response.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangascroll_core::StopReason;

    fn scratch_cache(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("mangascroll-read-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn options(name: &str) -> ReadOptions {
        ReadOptions {
            url: Some("https://example.com/manga/chapter-1".to_string()),
            extent: 1000.0,
            view: 500.0,
            speed: Some(5),
            cache_dir: scratch_cache(name),
            ..ReadOptions::default()
        }
    }

    #[test]
    fn parses_flags_and_url() {
        let args = [
            "https://example.com/chapter-2",
            "--extent",
            "3000",
            "--direction",
            "up",
            "--unreliable",
            "--max-frames",
            "50",
        ]
        .map(String::from);
        let options = ReadOptions::parse(args).expect("options");
        assert_eq!(options.url.as_deref(), Some("https://example.com/chapter-2"));
        assert_eq!(options.extent, 3000.0);
        assert_eq!(options.direction, Some(ScrollDirection::Backward));
        assert!(options.unreliable);
        assert_eq!(options.max_frames, 50);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(ReadOptions::parse(["--nope".to_string()]).is_err());
        assert!(ReadOptions::parse(["--speed".to_string()]).is_err());
    }

    #[test]
    fn forward_read_stops_at_bottom() {
        let options = options("forward");
        let summary = run_read(&AppConfig::default(), &options, &CancellationToken::new())
            .expect("read");
        let stop = summary.stop.expect("boundary reached");
        assert_eq!(stop.reason, StopReason::BoundaryReached);
        assert!((495.0..=500.0).contains(&summary.offset));
        assert_eq!(
            summary.title.as_deref(),
            Some("Chapter extracted from https://example.com/manga/chapter-1")
        );
        let _ = std::fs::remove_dir_all(&options.cache_dir);
    }

    #[test]
    fn unreliable_read_stops_on_stall() {
        let options = ReadOptions {
            unreliable: true,
            ..options("unreliable")
        };
        let summary = run_read(&AppConfig::default(), &options, &CancellationToken::new())
            .expect("read");
        assert_eq!(
            summary.stop.map(|stop| stop.reason),
            Some(StopReason::DimensionUnreliableStall)
        );
        assert_eq!(summary.offset, 500.0);
        let _ = std::fs::remove_dir_all(&options.cache_dir);
    }

    #[test]
    fn frame_budget_limits_the_run() {
        let options = ReadOptions {
            extent: 100_000.0,
            max_frames: 10,
            ..options("budget")
        };
        let summary = run_read(&AppConfig::default(), &options, &CancellationToken::new())
            .expect("read");
        assert_eq!(summary.frames, 10);
        assert!(summary.stop.is_none());
        let _ = std::fs::remove_dir_all(&options.cache_dir);
    }

    #[test]
    fn reuses_last_url_when_none_given() {
        let first = options("reuse");
        run_read(&AppConfig::default(), &first, &CancellationToken::new()).expect("first read");

        let second = ReadOptions {
            url: None,
            ..first.clone()
        };
        let summary = run_read(&AppConfig::default(), &second, &CancellationToken::new())
            .expect("second read");
        assert_eq!(summary.url, "https://example.com/manga/chapter-1");
        let _ = std::fs::remove_dir_all(&first.cache_dir);
    }

    #[test]
    fn missing_url_is_an_error() {
        let options = ReadOptions {
            url: None,
            ..options("missing")
        };
        assert!(run_read(&AppConfig::default(), &options, &CancellationToken::new()).is_err());
    }
}
