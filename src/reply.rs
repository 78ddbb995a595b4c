//! The reply contract handed to handlers and middleware.
//!
//! Handlers never see the raw `may_minihttp` response. They call exactly one
//! terminal method on [`Reply`] (`success`, `error`, `custom`, `html`) and
//! return the resulting [`ReplyPayload`]; the server serializes it.

use serde_json::{json, Value};
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
/// Most responses carry well under 16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because the same names repeat across requests
/// (`content-type`, `x-request-id`, ...) and `Arc::clone` is an O(1) atomic
/// increment; values remain per-request `String`s.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Which terminal reply method produced a payload.
///
/// The serialization hook only schema-validates `Success` payloads; `Error`
/// payloads serialize as-is and `Custom`/`Html` bypass the envelope entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Success,
    Error,
    Custom,
    Html,
}

/// A finished reply: status, envelope body, and response headers.
#[derive(Debug, Clone)]
pub struct ReplyPayload {
    pub status: u16,
    pub kind: ReplyKind,
    pub body: Value,
    pub headers: HeaderVec,
}

impl ReplyPayload {
    /// The `data` field of a success envelope, if this is one.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self.kind {
            ReplyKind::Success => self.body.get("data"),
            _ => None,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Success statuses must land in 200..=599; anything else becomes 200.
fn coerce_success_status(status: u16) -> u16 {
    if (200..600).contains(&status) {
        status
    } else {
        200
    }
}

/// Error statuses are forced to at least 400; anything outside 400..=599
/// becomes 400.
fn coerce_error_status(status: u16) -> u16 {
    if (400..600).contains(&status) {
        status
    } else {
        400
    }
}

/// The restricted reply API passed to handlers and middleware.
///
/// The contract is one terminal call per request; calling none or several is
/// a handler bug this layer does not police.
#[derive(Debug, Default)]
pub struct Reply {
    _private: (),
}

impl Reply {
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// `{"success": true, "data": <data>}` with status coerced into
    /// 200..=599 (200 when malformed).
    #[must_use]
    pub fn success(&self, status: u16, data: Value) -> ReplyPayload {
        ReplyPayload {
            status: coerce_success_status(status),
            kind: ReplyKind::Success,
            body: json!({ "success": true, "data": data }),
            headers: HeaderVec::new(),
        }
    }

    /// `{"success": false, "error": {"type", "message"}}` with status forced
    /// to at least 400 (400 when malformed). A missing message falls back to
    /// the error type.
    #[must_use]
    pub fn error(&self, status: u16, error_type: &str, message: Option<&str>) -> ReplyPayload {
        ReplyPayload {
            status: coerce_error_status(status),
            kind: ReplyKind::Error,
            body: json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": message.unwrap_or(error_type),
                }
            }),
            headers: HeaderVec::new(),
        }
    }

    /// Escape hatch: send `body` as-is with the given status. No envelope,
    /// no response-schema validation.
    #[must_use]
    pub fn custom(&self, status: u16, body: Value) -> ReplyPayload {
        ReplyPayload {
            status: coerce_success_status(status),
            kind: ReplyKind::Custom,
            body,
            headers: HeaderVec::new(),
        }
    }

    /// Send an HTML document with status 200 and `text/html` content type.
    #[must_use]
    pub fn html(&self, content: impl Into<String>) -> ReplyPayload {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/html".to_string()));
        ReplyPayload {
            status: 200,
            kind: ReplyKind::Html,
            body: Value::String(content.into()),
            headers,
        }
    }
}
