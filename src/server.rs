//! Local HTTP server hosting the proxy and metadata endpoints.

use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::http::{HttpRequest, HttpResponse, read_http_request, write_http_response};
use crate::manga_api;
use crate::proxy::{self, ProxyClient, Upstream, UpstreamMethod};
use anyhow::{Context, Result};
use chrono::Utc;
use mangascroll_core::protocol::PROXY_PREFIX;
use serde_json::json;
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Router {
    upstream: Arc<dyn Upstream>,
}

impl Router {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Router { upstream }
    }

    pub fn route(&self, request: &HttpRequest) -> HttpResponse {
        let path = request.path();
        let proxied = path.starts_with(PROXY_PREFIX);
        match (request.method.as_str(), path) {
            ("OPTIONS", _) => proxy::preflight(),
            ("GET", _) if proxied => proxy::relay(
                self.upstream.as_ref(),
                UpstreamMethod::Get,
                &request.target,
                None,
                &[],
            ),
            ("POST", _) if proxied => proxy::relay(
                self.upstream.as_ref(),
                UpstreamMethod::Post,
                &request.target,
                request.header("content-type"),
                &request.body,
            ),
            ("POST", "/api/manga") => {
                let (status, body) = manga_api::handle(&request.body, Utc::now());
                HttpResponse::json(status, &body)
            }
            (_, "/api/manga") => HttpResponse::json(
                405,
                &json!({ "success": false, "error": "Method not allowed" }),
            ),
            _ => HttpResponse::json(404, &json!({ "error": "Not found" })),
        }
    }
}

/// Serve until `cancel` fires.
pub fn serve(config: &AppConfig, cancel: &CancellationToken) -> Result<()> {
    let client = ProxyClient::new(&config.proxy_user_agent, config.proxy_timeout())?;
    let router = Arc::new(Router::new(Arc::new(client)));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).with_context(|| format!("failed to bind {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to make listener non-blocking")?;
    let local = listener.local_addr().context("failed to read local address")?;
    info!(addr = %local, "Serving proxy and manga API");

    while !cancel.is_cancelled() {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "Accepted connection");
                let router = Arc::clone(&router);
                let spawned = thread::Builder::new()
                    .name("mangascroll-conn".to_string())
                    .spawn(move || {
                        if let Err(err) = handle_connection(stream, &router) {
                            warn!(%peer, "Request error: {err:#}");
                        }
                    });
                if let Err(err) = spawned {
                    warn!("Failed to spawn connection thread: {err}");
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
            Err(err) => {
                warn!("Accept error: {err}");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

fn handle_connection(mut stream: TcpStream, router: &Router) -> Result<()> {
    stream
        .set_nonblocking(false)
        .context("failed to make connection blocking")?;
    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .context("failed to set read timeout")?;

    let response = match read_http_request(&mut stream) {
        Ok(request) => {
            let response = router.route(&request);
            info!(
                method = %request.method,
                path = request.path(),
                status = response.status,
                "Handled request"
            );
            response
        }
        Err(err) => {
            warn!("Malformed request: {err:#}");
            HttpResponse::json(400, &json!({ "error": "Bad request" }))
        }
    };
    write_http_response(&mut stream, &response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::UpstreamResponse;
    use crate::proxy::tests::ScriptedUpstream;

    fn request(method: &str, target: &str, body: &[u8]) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            target: target.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_vec(),
        }
    }

    fn router() -> Router {
        Router::new(Arc::new(ScriptedUpstream::answering(UpstreamResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: b"<html>page</html>".to_vec(),
        })))
    }

    #[test]
    fn proxies_get_requests() {
        let response = router().route(&request("GET", "/api/proxy/example.com/chapter-1", b""));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<html>page</html>");
        assert_eq!(
            response.header("X-Proxy-URL"),
            Some("https://example.com/chapter-1")
        );
    }

    #[test]
    fn answers_preflight_anywhere() {
        let response = router().route(&request("OPTIONS", "/api/manga", b""));
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn manga_api_is_routed() {
        let response = router().route(&request(
            "POST",
            "/api/manga",
            br#"{"action":"logView","url":"https://example.com/chapter-1"}"#,
        ));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"success":true}"#);
    }

    #[test]
    fn unknown_routes_are_not_found() {
        let response = router().route(&request("GET", "/nope", b""));
        assert_eq!(response.status, 404);
        let response = router().route(&request("GET", "/api/manga", b""));
        assert_eq!(response.status, 405);
    }
}
