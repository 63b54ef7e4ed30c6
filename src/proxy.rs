//! Same-origin relay for reader pages.
//!
//! `/api/proxy/<host>/<path>` is fetched from `https://<host>/<path>` with a
//! desktop browser User-Agent and returned with permissive CORS headers, so the
//! embedded frame can be measured and scrolled.

use crate::http::HttpResponse;
use anyhow::{Context, Result};
use mangascroll_core::protocol::upstream_url;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};

pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: UpstreamMethod,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Where proxied requests are sent.
pub trait Upstream: Send + Sync {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse>;
}

pub struct ProxyClient {
    client: Client,
    user_agent: String,
}

impl ProxyClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build proxy HTTP client")?;
        Ok(ProxyClient {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

impl Upstream for ProxyClient {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse> {
        let builder = match request.method {
            UpstreamMethod::Get => self.client.get(&request.url),
            UpstreamMethod::Post => {
                let content_type = request
                    .content_type
                    .as_deref()
                    .unwrap_or("application/json");
                self.client
                    .post(&request.url)
                    .header(CONTENT_TYPE, content_type)
                    .body(request.body.clone())
            }
        };
        let response = builder
            .header(USER_AGENT, &self.user_agent)
            .send()
            .with_context(|| format!("request to {} failed", request.url))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .with_context(|| format!("failed to read body from {}", request.url))?
            .to_vec();
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Attach the CORS headers every proxy answer carries.
pub fn with_cors(response: HttpResponse) -> HttpResponse {
    response
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
        .with_header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
}

pub fn preflight() -> HttpResponse {
    with_cors(HttpResponse::new(200, "text/plain", Vec::new()))
}

/// Relay one proxied request. `target` is the request path plus query.
pub fn relay(
    upstream: &dyn Upstream,
    method: UpstreamMethod,
    target: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> HttpResponse {
    let Some(url) = upstream_url(target) else {
        return with_cors(HttpResponse::json(
            400,
            &json!({ "error": "Missing target host" }),
        ));
    };

    let request = UpstreamRequest {
        method,
        url: url.clone(),
        content_type: content_type.map(str::to_string),
        body: body.to_vec(),
    };
    debug!(url = %url, ?method, bytes = body.len(), "Proxying request");

    match upstream.send(&request) {
        Ok(answer) => {
            info!(url = %url, status = answer.status, "Proxied response");
            let fallback = match method {
                UpstreamMethod::Get => "text/html",
                UpstreamMethod::Post => "application/json",
            };
            let content_type = answer.content_type.as_deref().unwrap_or(fallback);
            with_cors(HttpResponse::new(answer.status, content_type, answer.body))
                .with_header("X-Proxy-URL", url)
        }
        Err(err) => {
            error!(url = %url, "Proxy error: {err:#}");
            let message = match method {
                UpstreamMethod::Get => "Failed to fetch from target URL",
                UpstreamMethod::Post => "Failed to post to target URL",
            };
            with_cors(HttpResponse::json(500, &json!({ "error": message })))
        }
    }
}
