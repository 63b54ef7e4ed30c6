//! Remembers the most recently loaded reader URL.
//!
//! The value lives in `.cache/last_url.toml` as a single `url` field.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CACHE_DIR: &str = ".cache";

#[derive(serde::Serialize, serde::Deserialize)]
struct LastUrlEntry {
    url: String,
}

pub fn last_url_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("last_url.toml")
}

/// Load the stored URL, if any. Unreadable entries are treated as absent.
pub fn load_last_url(cache_dir: &Path) -> Option<String> {
    let data = fs::read_to_string(last_url_path(cache_dir)).ok()?;
    let entry: LastUrlEntry = toml::from_str(&data).ok()?;
    let url = entry.url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

/// Persist `url`. Failures are logged and otherwise ignored.
pub fn save_last_url(cache_dir: &Path, url: &str) {
    let path = last_url_path(cache_dir);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let entry = LastUrlEntry {
        url: url.trim().to_string(),
    };
    let contents = match toml::to_string(&entry) {
        Ok(contents) => contents,
        Err(err) => {
            warn!("Failed to encode last URL: {err}");
            return;
        }
    };
    match fs::File::create(&path).and_then(|mut file| file.write_all(contents.as_bytes())) {
        Ok(()) => debug!(path = %path.display(), "Saved last URL"),
        Err(err) => warn!(path = %path.display(), "Failed to save last URL: {err}"),
    }
}
