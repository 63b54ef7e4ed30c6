//! `POST /api/manga`: view logging and chapter metadata.
//!
//! There is no backing store yet; views are only logged and chapter info is
//! synthesized from the URL.

use chrono::{DateTime, SecondsFormat, Utc};
use mangascroll_core::protocol::{ACTION_FETCH_INFO, ACTION_LOG_VIEW};
use mangascroll_core::{ChapterInfo, MangaApiRequest, MangaApiResponse};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

const MIN_PAGE_COUNT: u32 = 10;
const PAGE_COUNT_SPAN: u32 = 30;

/// Handle one request body. Returns the HTTP status and JSON body.
pub fn handle(body: &[u8], now: DateTime<Utc>) -> (u16, MangaApiResponse) {
    let request: MangaApiRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            error!("API error: {err}");
            return (500, MangaApiResponse::failure("Internal server error"));
        }
    };

    match request.action.as_str() {
        ACTION_LOG_VIEW => {
            info!(
                url = %request.url,
                chapter = request.chapter.unwrap_or(1),
                "User viewed manga"
            );
            (200, MangaApiResponse::ok())
        }
        ACTION_FETCH_INFO => (200, MangaApiResponse::with_info(chapter_info(&request.url, now))),
        other => {
            warn!(action = other, "Rejected unknown manga API action");
            (400, MangaApiResponse::failure("Invalid action"))
        }
    }
}

pub fn chapter_info(url: &str, now: DateTime<Utc>) -> ChapterInfo {
    ChapterInfo {
        title: format!("Chapter extracted from {url}"),
        page_count: page_count_for(url),
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Stable page count in `[10, 39]` derived from the URL.
pub fn page_count_for(url: &str) -> u32 {
    let digest = Sha256::digest(url.as_bytes());
    let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    MIN_PAGE_COUNT + seed % PAGE_COUNT_SPAN
}
