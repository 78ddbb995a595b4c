//! Channel-based dispatch of matched requests to handler coroutines.
//!
//! Each registered route gets one coroutine consuming an mpsc channel; the
//! dispatcher sends the request and blocks the calling coroutine on the reply
//! channel. Handler panics are caught in the coroutine loop and surface as
//! internal errors, never as a crashed server.

use crate::errors::RequestError;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::reply::{HeaderVec, Reply, ReplyPayload};
use crate::router::ParamVec;
use anyhow::anyhow;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Handler signature: inspect the request, call exactly one terminal method
/// on the reply contract, return its payload.
pub type HandlerFn = dyn Fn(&HandlerRequest, &Reply) -> anyhow::Result<ReplyPayload> + Send + Sync;
pub type Handler = Arc<HandlerFn>;

/// Reply channel carried on each request.
pub type ReplySender = mpsc::Sender<anyhow::Result<ReplyPayload>>;

/// Channel sender that feeds a handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Request data passed to a handler coroutine.
///
/// `path_params` and `query_params` hold the raw strings from the URL;
/// `params`, `query` and `body` hold the facet values the handler should
/// read, replaced by their coerced forms when the route declares a schema.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Registered URL pattern (e.g. `/hello/:name`).
    pub url: String,
    /// Concrete request path (e.g. `/hello/alice`).
    pub path: String,
    /// Dispatch key, the route's unique name.
    pub route_name: String,
    /// Raw path parameters (stack-allocated for <=8 params).
    pub path_params: ParamVec,
    /// Raw query parameters (stack-allocated for <=8 params).
    pub query_params: ParamVec,
    /// Path params as a JSON object, coerced when a schema applies.
    pub params: Value,
    /// Query params as a JSON object, coerced when a schema applies.
    pub query: Value,
    /// JSON body, coerced when a schema applies.
    pub body: Option<Value>,
    /// Unconsumed payload bytes, kept only for `raw_body` routes.
    pub raw_body: Option<Vec<u8>>,
    /// Transfer encoding of the raw payload, when kept.
    pub transfer_encoding: Option<String>,
    /// HTTP headers (stack-allocated for <=16 headers).
    pub headers: HeaderVec,
    /// Cookies from the Cookie header (stack-allocated for <=16 cookies).
    pub cookies: HeaderVec,
    /// Channel for sending the handler's result back to the dispatcher.
    pub reply_tx: ReplySender,
}

impl HandlerRequest {
    /// Last write wins on duplicate names at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Last write wins on duplicate query names (`?limit=10&limit=20`).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
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

    /// Get a cookie by name.
    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Build a JSON object from raw string params, for routes without a schema
/// and as validation input for routes with one.
#[must_use]
pub fn params_to_object(params: &ParamVec) -> Value {
    let mut map = Map::new();
    for (k, v) in params {
        map.insert(k.to_string(), Value::String(v.clone()));
    }
    Value::Object(map)
}

/// Dispatcher owning the handler coroutines, keyed by route name.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerSender>,
    stack_size: usize,
}

impl Dispatcher {
    #[must_use]
    pub fn new(stack_size: usize) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            stack_size,
        }
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Spawn a coroutine consuming requests for `name` and record its sender.
    ///
    /// Replacing an existing handler drops the old sender, which closes its
    /// channel and lets the old coroutine exit.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime; the
    /// caller must ensure the runtime is initialized and that registration
    /// happens before the server starts accepting requests.
    pub unsafe fn register_handler(&mut self, name: &str, handler: Handler) {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();

        if self.handlers.remove(&name).is_some() {
            warn!(
                route_name = %name,
                "Replaced existing handler, old coroutine will exit"
            );
        }

        let coroutine_name = name.clone();
        let stack_size = self.stack_size;
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(
                        route_name = %coroutine_name,
                        stack_size = stack_size,
                        "Handler coroutine start"
                    );
                    for req in rx.iter() {
                        let reply_tx = req.reply_tx.clone();
                        let request_id = req.request_id;
                        let started = Instant::now();

                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(
                            || handler(&req, &Reply::new()),
                        ));
                        match outcome {
                            Ok(result) => {
                                info!(
                                    request_id = %request_id,
                                    route_name = %coroutine_name,
                                    execution_time_ms = started.elapsed().as_millis() as u64,
                                    "Handler execution complete"
                                );
                                let _ = reply_tx.send(result);
                            }
                            Err(panic) => {
                                let panic_message = format!("{panic:?}");
                                error!(
                                    request_id = %request_id,
                                    route_name = %coroutine_name,
                                    panic_message = %panic_message,
                                    "Handler panicked"
                                );
                                let _ = reply_tx
                                    .send(Err(anyhow!("handler panicked: {panic_message}")));
                            }
                        }
                    }
                })
        };

        if let Err(e) = spawn_result {
            error!(
                route_name = %name,
                error = %e,
                stack_size = stack_size,
                "Failed to spawn handler coroutine"
            );
            return;
        }

        self.handlers.insert(name, tx);
    }

    /// Run the route's middleware chain, then hand the request to its
    /// coroutine and wait for the result.
    ///
    /// A middleware returning an early payload skips the remaining chain and
    /// the handler; a middleware error aborts the chain. Missing handlers,
    /// handler errors, closed channels, and panics all classify as internal.
    pub fn dispatch(
        &self,
        mut request: HandlerRequest,
        middlewares: &[Arc<dyn Middleware>],
    ) -> Result<ReplyPayload, RequestError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        request.reply_tx = reply_tx;

        let reply = Reply::new();
        for (idx, mw) in middlewares.iter().enumerate() {
            match mw.call(&request, &reply) {
                Ok(None) => {}
                Ok(Some(payload)) => {
                    debug!(
                        request_id = %request.request_id,
                        middleware_idx = idx,
                        status = payload.status,
                        "Middleware returned early reply"
                    );
                    return Ok(payload);
                }
                Err(e) => {
                    warn!(
                        request_id = %request.request_id,
                        middleware_idx = idx,
                        error = %e,
                        "Middleware failed, aborting chain"
                    );
                    return Err(RequestError::Internal(e));
                }
            }
        }

        let Some(tx) = self.handlers.get(&request.route_name) else {
            error!(
                route_name = %request.route_name,
                available_handlers = self.handlers.len(),
                "Handler not found"
            );
            return Err(RequestError::Internal(anyhow!(
                "no handler registered for route {}",
                request.route_name
            )));
        };

        info!(
            request_id = %request.request_id,
            route_name = %request.route_name,
            method = %request.method,
            path = %request.path,
            "Request dispatched to handler"
        );

        let request_id = request.request_id;
        let route_name = request.route_name.clone();
        let started = Instant::now();
        if let Err(e) = tx.send(request) {
            error!(
                request_id = %request_id,
                route_name = %route_name,
                error = %e,
                "Failed to send request to handler"
            );
            return Err(RequestError::Internal(anyhow!(
                "handler channel closed for route {route_name}"
            )));
        }

        match reply_rx.recv() {
            Ok(Ok(payload)) => {
                info!(
                    request_id = %request_id,
                    route_name = %route_name,
                    latency_ms = started.elapsed().as_millis() as u64,
                    status = payload.status,
                    "Handler result received"
                );
                Ok(payload)
            }
            Ok(Err(e)) => Err(RequestError::Internal(e)),
            Err(e) => {
                error!(
                    request_id = %request_id,
                    route_name = %route_name,
                    error = %e,
                    "Handler channel closed before reply"
                );
                Err(RequestError::Internal(anyhow!(
                    "handler for route {route_name} is not responding"
                )))
            }
        }
    }
}
