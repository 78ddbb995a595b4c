//! Decorator adapters for tracing instrumentation.
//!
//! Both wrappers return new function values; the wrapped function is never
//! mutated and callers observe unchanged signatures and results. The span
//! lives in the closure scope, so it ends exactly once on every path.

use crate::dispatcher::Handler;
use std::sync::Arc;
use tracing::{field, info_span};

/// Wrap a service function with a span that records its logical name and
/// namespace, marks ok/error status, and re-propagates the error untouched.
pub fn traced_fn<A, T, F>(
    namespace: &str,
    name: &str,
    f: F,
) -> impl Fn(A) -> anyhow::Result<T>
where
    F: Fn(A) -> anyhow::Result<T>,
{
    let namespace = namespace.to_string();
    let name = name.to_string();
    move |arg: A| {
        let span = info_span!(
            "function",
            function.name = %name,
            function.namespace = %namespace,
            status = field::Empty,
            error.message = field::Empty,
        );
        let _guard = span.enter();
        match f(arg) {
            Ok(value) => {
                span.record("status", "ok");
                Ok(value)
            }
            Err(e) => {
                span.record("status", "error");
                span.record("error.message", field::display(&e));
                Err(e)
            }
        }
    }
}

/// Wrap a route handler the same way, carrying the request id as a span
/// attribute for correlation.
#[must_use]
pub fn traced_handler(namespace: &str, name: &str, handler: Handler) -> Handler {
    let namespace = namespace.to_string();
    let name = name.to_string();
    Arc::new(move |req, reply| {
        let span = info_span!(
            "handler",
            handler.name = %name,
            handler.namespace = %namespace,
            request_id = %req.request_id,
            status = field::Empty,
            error.message = field::Empty,
        );
        let _guard = span.enter();
        match handler(req, reply) {
            Ok(payload) => {
                span.record("status", "ok");
                Ok(payload)
            }
            Err(e) => {
                span.record("status", "error");
                span.record("error.message", field::display(&e));
                Err(e)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_traced_fn_passes_through_ok() {
        let f = traced_fn("greeter", "format_greeting", |name: &str| {
            Ok(format!("Hello, {name}!"))
        });
        assert_eq!(f("alice").unwrap(), "Hello, alice!");
    }

    #[test]
    fn test_traced_fn_repropagates_error() {
        let f = traced_fn("greeter", "always_fails", |_: ()| -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        });
        let err = f(()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
