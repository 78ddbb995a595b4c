use super::request::{parse_request, ParsedRequest};
use super::response::write_response;
use crate::dispatcher::{params_to_object, Dispatcher, HandlerRequest};
use crate::errors::RequestError;
use crate::ids::RequestId;
use crate::instrument::{RequestSpans, Stage};
use crate::middleware::{CorsMiddleware, Middleware};
use crate::reply::{HeaderVec, Reply, ReplyKind, ReplyPayload};
use crate::resource::RouteDef;
use crate::router::{RouteMatch, Router};
use crate::static_files::StaticFiles;
use crate::validation::{Facet, ValidationIssue};
use http::Method;
use may::sync::mpsc;
use may_minihttp::{HttpService, Request, Response};
use serde_json::{json, Map, Value};
use std::io;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// The HTTP service: parses the request, routes it, applies the global
/// validation/serialization hooks around dispatch, and writes the uniform
/// envelope.
///
/// Per-request stage order is fixed: parsing, validation, middleware chain,
/// handler, serialization, sending. Each stage runs in its own span when
/// instrumentation is enabled.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub static_files: Option<Arc<StaticFiles>>,
    pub cors: Option<Arc<CorsMiddleware>>,
    /// Middlewares enabled server-wide, run before each route's own chain.
    pub global_middlewares: Vec<Arc<dyn Middleware>>,
    pub cookies_enabled: bool,
    pub formbody_enabled: bool,
    /// Upload size limit for multipart payloads, when the plugin is enabled.
    pub multipart_limit: Option<usize>,
    pub instrument: bool,
}

impl AppService {
    #[must_use]
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            router,
            dispatcher,
            static_files: None,
            cors: None,
            global_middlewares: Vec::new(),
            cookies_enabled: false,
            formbody_enabled: false,
            multipart_limit: None,
            instrument: false,
        }
    }

    /// Decode the payload: JSON bodies always, form bodies when the plugin
    /// is enabled, multipart size enforced when configured. Undecodable
    /// bodies stay `None` for schema validation to reject.
    fn parse_body(
        &self,
        parsed: &ParsedRequest,
        route: &RouteDef,
    ) -> Result<(Option<Value>, Option<Vec<u8>>, Option<String>), RequestError> {
        let content_type = parsed.get_header("content-type").unwrap_or("");

        if let Some(limit) = self.multipart_limit {
            if content_type.starts_with("multipart/form-data") && parsed.body.len() > limit {
                return Err(RequestError::PayloadTooLarge { limit });
            }
        }

        let body = if parsed.body.is_empty() {
            None
        } else if content_type.starts_with("application/json") {
            match serde_json::from_slice(&parsed.body) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(error = %e, "JSON body parse failed");
                    None
                }
            }
        } else if self.formbody_enabled
            && content_type.starts_with("application/x-www-form-urlencoded")
        {
            let mut map = Map::new();
            for (k, v) in url::form_urlencoded::parse(&parsed.body) {
                map.insert(k.to_string(), Value::String(v.to_string()));
            }
            Some(Value::Object(map))
        } else {
            None
        };

        let (raw_body, transfer_encoding) = if route.config.raw_body {
            (
                Some(parsed.body.clone()),
                parsed.get_header("transfer-encoding").map(str::to_string),
            )
        } else {
            (None, None)
        };

        Ok((body, raw_body, transfer_encoding))
    }

    /// Validate each facet the route declares a schema for; on success the
    /// coerced values replace the raw ones. All issues from all facets are
    /// collected into one mismatch.
    fn validate(
        &self,
        parsed: &ParsedRequest,
        route_match: &RouteMatch,
        body: Option<Value>,
    ) -> Result<(Value, Value, Option<Value>), RequestError> {
        let mut params = params_to_object(&route_match.path_params);
        let mut query = params_to_object(&route_match.query_params);
        let mut body = body;

        let Some(schema) = &route_match.route.compiled else {
            return Ok((params, query, body));
        };

        let mut issues = Vec::new();
        if let Some(facet) = &schema.params {
            match facet.validate(Facet::Params, &params) {
                Ok(v) => params = v,
                Err(mut e) => issues.append(&mut e),
            }
        }
        if let Some(facet) = &schema.querystring {
            match facet.validate(Facet::Querystring, &query) {
                Ok(v) => query = v,
                Err(mut e) => issues.append(&mut e),
            }
        }
        if let Some(facet) = &schema.body {
            let input = body.clone().unwrap_or(Value::Null);
            match facet.validate(Facet::Body, &input) {
                Ok(v) => body = Some(v),
                Err(mut e) => issues.append(&mut e),
            }
        }

        if issues.is_empty() {
            Ok((params, query, body))
        } else {
            Err(RequestError::RequestSchemaMismatch {
                method: parsed.method.clone(),
                url: parsed.path.clone(),
                issues,
            })
        }
    }

    /// Enforce the response contract on success payloads. Error payloads
    /// serialize as-is; custom and HTML payloads bypass the envelope.
    fn check_response(
        &self,
        parsed: &ParsedRequest,
        route: &RouteDef,
        payload: &ReplyPayload,
    ) -> Result<(), RequestError> {
        if payload.kind != ReplyKind::Success {
            return Ok(());
        }
        let Some(schema) = &route.compiled else {
            return Ok(());
        };
        let Some(validator) = schema.response_for(payload.status) else {
            return Err(RequestError::ResponseSchemaMismatch {
                method: parsed.method.clone(),
                url: parsed.path.clone(),
                issues: vec![ValidationIssue::new(
                    "response",
                    "undeclared_status",
                    format!("no response schema declared for status {}", payload.status),
                )],
            });
        };
        let data = payload.data().cloned().unwrap_or(Value::Null);
        match validator.validate(Facet::Response, &data) {
            Ok(_) => Ok(()),
            Err(issues) => Err(RequestError::ResponseSchemaMismatch {
                method: parsed.method.clone(),
                url: parsed.path.clone(),
                issues,
            }),
        }
    }

    fn process(
        &self,
        parsed: &ParsedRequest,
        request_id: RequestId,
        route_match: &RouteMatch,
        spans: &RequestSpans,
    ) -> Result<ReplyPayload, RequestError> {
        let route = &route_match.route;

        let (body, raw_body, transfer_encoding) =
            spans.stage(Stage::Parsing, || self.parse_body(parsed, route))?;

        let (params, query, body) =
            spans.stage(Stage::Validation, || self.validate(parsed, route_match, body))?;

        // Placeholder channel; dispatch installs the real reply channel.
        let (reply_tx, _placeholder_rx) = mpsc::channel();
        let request = HandlerRequest {
            request_id,
            method: parsed.method.clone(),
            url: route_match.url.clone(),
            path: parsed.path.clone(),
            route_name: route.name.clone(),
            path_params: route_match.path_params.clone(),
            query_params: route_match.query_params.clone(),
            params,
            query,
            body,
            raw_body,
            transfer_encoding,
            headers: parsed.headers.clone(),
            cookies: if self.cookies_enabled {
                parsed.cookies.clone()
            } else {
                HeaderVec::new()
            },
            reply_tx,
        };

        let payload = if self.global_middlewares.is_empty() {
            self.dispatcher.dispatch(request, &route.middlewares)?
        } else {
            let mut chain = self.global_middlewares.clone();
            chain.extend(route.middlewares.iter().map(Arc::clone));
            self.dispatcher.dispatch(request, &chain)?
        };

        spans.stage(Stage::Serialization, || {
            self.check_response(parsed, route, &payload)
        })?;

        Ok(payload)
    }

    fn send(
        &self,
        res: &mut Response,
        parsed: &ParsedRequest,
        request_id: RequestId,
        spans: &RequestSpans,
        mut payload: ReplyPayload,
    ) {
        spans.stage(Stage::Sending, || {
            if let Some(cors) = &self.cors {
                if parsed.method != Method::OPTIONS {
                    cors.apply(&mut payload);
                }
            }
            payload.set_header("x-request-id", request_id.to_string());

            let (content_type, bytes) = match (&payload.kind, &payload.body) {
                (ReplyKind::Html, Value::String(s)) => ("text/html", s.clone().into_bytes()),
                (_, body) => (
                    "application/json",
                    serde_json::to_vec(body).unwrap_or_default(),
                ),
            };
            spans.finish(payload.status, bytes.len());
            write_response(res, payload.status, &payload.headers, content_type, bytes);
        });
    }
}

/// Infrastructure endpoint, always registered: `GET /health`.
fn health_body() -> Vec<u8> {
    json!({ "status": "ok" }).to_string().into_bytes()
}

fn not_found_body(method: &Method, path: &str) -> Vec<u8> {
    json!({
        "success": false,
        "error": {
            "type": "not_found",
            "message": format!("no route for {method} {path}"),
        }
    })
    .to_string()
    .into_bytes()
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let request_id = RequestId::from_header_or_new(parsed.get_header("x-request-id"));

        if parsed.method == Method::GET && parsed.path == "/health" {
            write_response(res, 200, &HeaderVec::new(), "application/json", health_body());
            return Ok(());
        }

        let spans = if self.instrument {
            RequestSpans::new(
                parsed.method.as_str(),
                &parsed.path,
                parsed.get_header("x-forwarded-for").unwrap_or("-"),
                parsed.get_header("host").unwrap_or("-"),
                parsed.body.len(),
                parsed.get_header("user-agent").unwrap_or("-"),
            )
        } else {
            RequestSpans::disabled()
        };
        let _top = spans.enter();

        // Preflight requests have no registered route; answer them here.
        if parsed.method == Method::OPTIONS {
            if let Some(cors) = &self.cors {
                let mut payload = Reply::new().custom(204, Value::Null);
                cors.apply(&mut payload);
                payload.set_header("x-request-id", request_id.to_string());
                spans.finish(204, 0);
                write_response(res, 204, &payload.headers, "application/json", Vec::new());
                return Ok(());
            }
        }

        let Some(mut route_match) = self.router.route(&parsed.method, &parsed.path) else {
            if parsed.method == Method::GET {
                if let Some(sf) = &self.static_files {
                    let p = parsed.path.trim_start_matches('/');
                    let p = if p.is_empty() { "index.html" } else { p };
                    if let Ok((bytes, ct)) = sf.load(p) {
                        spans.finish(200, bytes.len());
                        write_response(res, 200, &HeaderVec::new(), ct, bytes);
                        return Ok(());
                    }
                }
            }
            warn!(
                request_id = %request_id,
                method = %parsed.method,
                path = %parsed.path,
                "Not found"
            );
            let body = not_found_body(&parsed.method, &parsed.path);
            spans.finish(404, body.len());
            write_response(res, 404, &HeaderVec::new(), "application/json", body);
            return Ok(());
        };

        spans.set_route(&route_match.url);
        route_match.query_params = parsed.query_params.clone();

        let payload = match self.process(&parsed, request_id, &route_match, &spans) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    request_id = %request_id,
                    method = %parsed.method,
                    path = %parsed.path,
                    error_type = err.error_type(),
                    error = %err,
                    "Request failed"
                );
                err.to_payload()
            }
        };

        self.send(res, &parsed, request_id, &spans, payload);
        Ok(())
    }
}
