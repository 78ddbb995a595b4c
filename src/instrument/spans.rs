//! Per-request span structure.
//!
//! One `request` span covers the whole request; each processing stage opens
//! exactly one child span for its duration. Stages run inside [`RequestSpans::stage`],
//! whose closure scope guarantees every opened span closes before `request`
//! does, errors included.

use tracing::{field, info_span, Span};

/// Fixed request-processing stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Validation,
    Serialization,
    Sending,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parsing => "parsing",
            Stage::Validation => "validation",
            Stage::Serialization => "serialization",
            Stage::Sending => "sending",
        }
    }
}

/// The open `request` span plus the stage API.
pub struct RequestSpans {
    top: Span,
}

impl RequestSpans {
    /// Open the top-level span with the request attributes known at parse
    /// time. The matched route, status, and response length are recorded
    /// later via [`RequestSpans::set_route`] and [`RequestSpans::finish`].
    #[must_use]
    pub fn new(
        method: &str,
        url: &str,
        client_ip: &str,
        host: &str,
        content_length: usize,
        user_agent: &str,
    ) -> Self {
        let top = info_span!(
            "request",
            http.method = %method,
            http.route = field::Empty,
            url.path = %url,
            client.ip = %client_ip,
            server.host = %host,
            http.request_content_length = content_length,
            http.user_agent = %user_agent,
            http.status_code = field::Empty,
            http.response_content_length = field::Empty,
            status = field::Empty,
        );
        Self { top }
    }

    /// No-op spans for servers without instrumentation enabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self { top: Span::none() }
    }

    /// Record the matched route pattern once routing has run.
    pub fn set_route(&self, route: &str) {
        self.top.record("http.route", route);
    }

    /// Run `f` inside the named stage span. The span opens on entry and
    /// closes when `f` returns, success or error.
    ///
    /// A disabled request span disables its stage spans too; `parent:` with
    /// `Span::none()` would otherwise open the stages as root spans.
    pub fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> T) -> T {
        if self.top.is_disabled() {
            return f();
        }
        let span = match stage {
            Stage::Parsing => info_span!(parent: &self.top, "parsing"),
            Stage::Validation => info_span!(parent: &self.top, "validation"),
            Stage::Serialization => info_span!(parent: &self.top, "serialization"),
            Stage::Sending => info_span!(parent: &self.top, "sending"),
        };
        span.in_scope(f)
    }

    /// Record the response outcome on the top span. Status `< 500` counts as
    /// ok; server errors mark the span as error.
    pub fn finish(&self, status: u16, response_length: usize) {
        self.top.record("http.status_code", status);
        self.top.record("http.response_content_length", response_length);
        self.top
            .record("status", if status < 500 { "ok" } else { "error" });
    }

    /// Enter the top span for the duration of the returned guard.
    #[must_use]
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.top.enter()
    }
}
