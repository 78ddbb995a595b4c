use crate::reply::HeaderVec;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Distinct header lines cached before unique ones stop being recorded.
const HEADER_CACHE_CAP: usize = 256;

static HEADER_LINES: Lazy<Mutex<HashMap<String, &'static str>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Turn a header into the `&'static str` line the engine requires.
///
/// Header lines repeat across responses (content types, CORS headers), so
/// each distinct line leaks once and is reused from the cache. Genuinely
/// per-response lines such as `x-request-id` still leak, but are never
/// cached past the cap.
fn intern_header_line(name: &str, value: &str) -> &'static str {
    let line = format!("{name}: {value}");
    let mut cache = HEADER_LINES
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(cached) = cache.get(line.as_str()) {
        return cached;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    if cache.len() < HEADER_CACHE_CAP {
        cache.insert(leaked.to_string(), leaked);
    }
    leaked
}

fn content_type_line(content_type: &str) -> &'static str {
    match content_type {
        "application/json" => "Content-Type: application/json",
        "text/html" => "Content-Type: text/html",
        "text/css" => "Content-Type: text/css",
        "application/javascript" => "Content-Type: application/javascript",
        "text/plain" => "Content-Type: text/plain",
        "image/svg+xml" => "Content-Type: image/svg+xml",
        "image/png" => "Content-Type: image/png",
        "image/x-icon" => "Content-Type: image/x-icon",
        "application/octet-stream" => "Content-Type: application/octet-stream",
        other => intern_header_line("Content-Type", other),
    }
}

/// Write a finished reply to the wire.
///
/// `content_type` applies unless the payload headers already carry one.
pub fn write_response(
    res: &mut Response,
    status: u16,
    headers: &HeaderVec,
    content_type: &str,
    body: Vec<u8>,
) {
    res.status_code(status as usize, status_reason(status));

    let has_content_type = headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
    if !has_content_type {
        res.header(content_type_line(content_type));
    }
    for (name, value) in headers {
        res.header(intern_header_line(name, value));
    }

    res.body_vec(body);
}
