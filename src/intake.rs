// =============================================================================
// intake.rs — THE FRONT DOOR
// =============================================================================
//
// A hand-rolled HTTP/1.1 listener for exactly one endpoint:
//
//   POST /track/pageview   (JSON body)  ->  JSON intake response
//
// Could this be a web framework? Sure. But the entire protocol surface is
// "one POST route plus a health check", and a TcpListener, a read loop,
// and a format! have never had a CVE in this codebase. Each connection is
// served on its own task; the handler behind it does all the thinking.
//
// Error contract on the wire:
//   400 — missing integrationKey/content, or a body we can't parse
//   401 — integration key didn't resolve to an active website
//   404 — any other route
//   500 — record store failure or other internal trouble
// =============================================================================

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::IntakeError;
use crate::handler::IntakeHandler;
use crate::metrics::MetricsCollector;
use crate::models::PageViewRequest;

// Beacon payloads are page text, so give them headroom, but a "page" that
// arrives as 4 MB of JSON is an attack, not an article.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
const MAX_HEADER_BYTES: usize = 16 * 1024;

pub async fn run_intake_server(
    handler: Arc<IntakeHandler>,
    metrics: Arc<MetricsCollector>,
    port: u16,
    shutdown: &mut watch::Receiver<bool>,
) {
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind intake server on :{port}: {e}");
            return;
        }
    };

    info!("intake server listening on http://0.0.0.0:{port}");

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        let handler = handler.clone();
                        let metrics = metrics.clone();
                        tokio::spawn(async move {
                            debug!(peer = %addr, "intake connection accepted");
                            serve_connection(stream, handler, metrics).await;
                        });
                    }
                    Err(e) => {
                        error!("intake server accept error: {e}");
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("intake server: shutting down");
                break;
            }
        }
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    handler: Arc<IntakeHandler>,
    metrics: Arc<MetricsCollector>,
) {
    let (status, body) = match read_request(&mut stream).await {
        Ok(Some(request)) => route(request, handler, &metrics).await,
        Ok(None) => (400, json!({"success": false, "error": "Malformed request"})),
        Err(e) => {
            debug!(error = %e, "failed to read intake request");
            (400, json!({"success": false, "error": "Malformed request"}))
        }
    };

    let payload = body.to_string();
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        payload.len(),
        payload,
    );
    let _ = stream.write_all(response.as_bytes()).await;
}

async fn route(
    request: RawRequest,
    handler: Arc<IntakeHandler>,
    metrics: &MetricsCollector,
) -> (u16, serde_json::Value) {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/track/pageview") => {
            let beacon: PageViewRequest = match serde_json::from_slice(&request.body) {
                Ok(b) => b,
                Err(e) => {
                    debug!(error = %e, "unparseable beacon body");
                    return (
                        400,
                        json!({"success": false, "error": "Invalid JSON body"}),
                    );
                }
            };

            // The handler runs in its own task so a panic anywhere in
            // the pipeline unwinds into a JoinError here, and the caller
            // still gets a well-formed generic 500 instead of a socket
            // that just goes quiet.
            let verdict = match tokio::spawn(async move { handler.handle(beacon).await }).await {
                Ok(result) => result,
                Err(join_err) => Err(IntakeError::Internal(anyhow!(
                    "request handling panicked: {join_err}"
                ))),
            };

            match verdict {
                Ok(response) => match serde_json::to_value(&response) {
                    Ok(value) => (200, value),
                    Err(e) => {
                        metrics.internal_error();
                        error!(error = %e, "intake response failed to serialize");
                        (
                            500,
                            json!({"success": false, "error": "Internal server error"}),
                        )
                    }
                },
                Err(e) => {
                    if matches!(e, IntakeError::Store(_) | IntakeError::Internal(_)) {
                        metrics.internal_error();
                        error!(error = %e, "intake request failed");
                    }
                    (
                        e.status_code(),
                        json!({"success": false, "error": e.public_message()}),
                    )
                }
            }
        }
        ("GET", "/health") => (200, json!({"status": "operational"})),
        (method, path) => {
            debug!(method, path, "no such route");
            (404, json!({"success": false, "error": "Not found"}))
        }
    }
}

struct RawRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

/// Read one HTTP/1.1 request off the socket. Minimal on purpose: request
/// line, headers until the blank line, then exactly Content-Length bytes
/// of body. Anything that doesn't fit that shape comes back as None.
async fn read_request(stream: &mut TcpStream) -> anyhow::Result<Option<RawRequest>> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    // Pull bytes until we've seen the end of the header block.
    let header_end = loop {
        if let Some(pos) = memchr::memmem::find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > MAX_HEADER_BYTES {
            warn!("intake request headers exceeded {MAX_HEADER_BYTES} bytes");
            return Ok(None);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]);
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };
    let method = method.to_string();
    // Strip any query string; routing only cares about the path.
    let path = path.split('?').next().unwrap_or(path).to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        warn!(content_length, "intake body over the size ceiling — dropping");
        return Ok(None);
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(Some(RawRequest { method, path, body }))
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
