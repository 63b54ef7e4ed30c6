//! JSON shapes exchanged with the web front end.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const PROXY_PREFIX: &str = "/api/proxy/";

pub const ACTION_LOG_VIEW: &str = "logView";
pub const ACTION_FETCH_INFO: &str = "fetchInfo";

/// Body of `POST /api/manga`. The action stays a string so unknown actions can
/// be answered with a 400 instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MangaApiRequest {
    pub action: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub chapter: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChapterInfo {
    pub title: String,
    pub page_count: u32,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MangaApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<ChapterInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl MangaApiResponse {
    pub fn ok() -> Self {
        MangaApiResponse {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn with_info(info: ChapterInfo) -> Self {
        MangaApiResponse {
            success: true,
            data: Some(info),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        MangaApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Same-origin path under which the proxy serves `url`. Empty input maps to
/// an empty path.
pub fn proxy_path(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    let lower = url.to_ascii_lowercase();
    let stripped = if lower.starts_with("https://") {
        &url["https://".len()..]
    } else if lower.starts_with("http://") {
        &url["http://".len()..]
    } else {
        url
    };
    format!("{PROXY_PREFIX}{stripped}")
}

/// Inverse of [`proxy_path`]: the upstream URL for a proxied request path.
/// The upstream is always fetched over https.
pub fn upstream_url(path_and_query: &str) -> Option<String> {
    let rest = path_and_query.strip_prefix(PROXY_PREFIX)?;
    let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
    if host_end == 0 {
        return None;
    }
    Some(format!("https://{rest}"))
}
