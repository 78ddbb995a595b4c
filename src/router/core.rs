//! Route table and request matching. Hot path: immutable after startup.

use crate::resource::RouteDef;
use anyhow::Context;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
/// Most REST paths carry well under 8 params.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the static route table
/// and `Arc::clone` is an O(1) atomic increment; values remain per-request
/// `String`s from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of matching a request path against the route table.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteDef>,
    /// Final registered URL pattern (prefix applied, trailing slash stripped).
    pub url: String,
    pub path_params: ParamVec,
    /// Populated by the server from the query string.
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Last write wins on duplicate names at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct RouteEntry {
    method: Method,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    url: String,
    route: Arc<RouteDef>,
}

/// Regex-based route table built once at registration time.
#[derive(Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a route under its final URL. Returns an error when the URL
    /// cannot be compiled to a matcher or the route's schema is invalid.
    pub fn add_route(&mut self, url: &str, route: RouteDef) -> anyhow::Result<()> {
        self.add_routes(vec![(url.to_string(), route)])
    }

    /// Register a batch of routes. Matchers and schema validators compile
    /// first; the table only changes when the whole batch succeeds, so a
    /// failing route never leaves its siblings half-registered.
    pub fn add_routes(&mut self, routes: Vec<(String, RouteDef)>) -> anyhow::Result<()> {
        let mut entries = Vec::with_capacity(routes.len());
        for (url, mut route) in routes {
            let (regex, param_names) =
                path_to_regex(&url).with_context(|| format!("route {}", route.name))?;
            route
                .compile_schema()
                .with_context(|| format!("route {}", route.name))?;
            entries.push(RouteEntry {
                method: route.method.clone(),
                regex,
                param_names,
                url,
                route: Arc::new(route),
            });
        }

        for entry in entries {
            info!(
                method = %entry.method,
                url = %entry.url,
                route_name = %entry.route.name,
                "Route registered"
            );
            self.entries.push(entry);
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered URL patterns in registration order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }

    /// Match a request to a route, first match in registration order wins.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");

        for entry in &self.entries {
            if entry.method != *method {
                continue;
            }
            let Some(caps) = entry.regex.captures(path) else {
                continue;
            };
            let mut path_params = ParamVec::new();
            for (idx, name) in entry.param_names.iter().enumerate() {
                if let Some(m) = caps.get(idx + 1) {
                    path_params.push((Arc::clone(name), m.as_str().to_string()));
                }
            }
            debug!(
                method = %method,
                path = %path,
                url = %entry.url,
                route_name = %entry.route.name,
                "Route matched"
            );
            return Some(RouteMatch {
                route: Arc::clone(&entry.route),
                url: entry.url.clone(),
                path_params,
                query_params: ParamVec::new(),
            });
        }

        warn!(method = %method, path = %path, "No route matched");
        None
    }
}

/// Compile a URL pattern into a matcher and its ordered parameter names.
///
/// `:name` segments (and `{name}` for compatibility) capture one path
/// segment each: `/hello/:name` becomes `^/hello/([^/]+)$` with `["name"]`.
pub(crate) fn path_to_regex(url: &str) -> anyhow::Result<(Regex, Vec<Arc<str>>)> {
    if url == "/" {
        return Ok((Regex::new(r"^/$")?, Vec::new()));
    }

    let mut pattern = String::with_capacity(url.len() + 8);
    pattern.push('^');
    let mut param_names = Vec::new();

    for segment in url.split('/') {
        if segment.is_empty() {
            continue;
        }
        let param = segment.strip_prefix(':').or_else(|| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
        });
        match param {
            Some(name) => {
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            }
            None => {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
    }

    pattern.push('$');
    Ok((Regex::new(&pattern)?, param_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Handler;
    use crate::reply::Reply;
    use crate::validation::RouteSchema;
    use serde_json::{json, Value};

    fn noop_handler() -> Handler {
        Arc::new(|_req, reply: &Reply| Ok(reply.success(200, Value::Null)))
    }

    fn def(name: &str, method: Method, path: &str) -> RouteDef {
        RouteDef::new(name, method, path, noop_handler())
    }

    #[test]
    fn test_path_to_regex_colon_params() {
        let (re, names) = path_to_regex("/hello/:name").unwrap();
        assert!(re.is_match("/hello/alice"));
        assert!(!re.is_match("/hello/alice/extra"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_ref(), "name");
    }

    #[test]
    fn test_path_to_regex_brace_params() {
        let (re, names) = path_to_regex("/pets/{id}/toys/{toy_id}").unwrap();
        assert!(re.is_match("/pets/1/toys/2"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_route_extracts_params() {
        let mut router = Router::new();
        router
            .add_route("/hello/:name", def("hello", Method::GET, "/hello/:name"))
            .unwrap();

        let m = router.route(&Method::GET, "/hello/alice").unwrap();
        assert_eq!(m.get_path_param("name"), Some("alice"));
        assert_eq!(m.url, "/hello/:name");
        assert!(router.route(&Method::POST, "/hello/alice").is_none());
        assert!(router.route(&Method::GET, "/goodbye/alice").is_none());
    }

    #[test]
    fn test_root_route() {
        let mut router = Router::new();
        router
            .add_route("/", def("root", Method::GET, "/"))
            .unwrap();
        assert!(router.route(&Method::GET, "/").is_some());
        assert!(router.route(&Method::GET, "/x").is_none());
    }

    #[test]
    fn test_add_routes_is_all_or_nothing() {
        let mut router = Router::new();
        let good = def("good", Method::GET, "/good");
        let bad = def("bad", Method::GET, "/bad")
            .schema(RouteSchema::for_status(200, json!({ "pattern": "[" })));
        let err = router
            .add_routes(vec![("/good".into(), good), ("/bad".into(), bad)])
            .unwrap_err();
        assert!(err.to_string().contains("route bad"), "{err}");
        assert!(router.is_empty());
    }

    #[test]
    fn test_add_route_compiles_schema() {
        let mut router = Router::new();
        let route = def("hello", Method::GET, "/hello/:name").schema(RouteSchema::for_status(
            200,
            json!({ "type": "string" }),
        ));
        router.add_route("/hello/:name", route).unwrap();
        let m = router.route(&Method::GET, "/hello/alice").unwrap();
        assert!(m.route.compiled.is_some());
    }

    #[test]
    fn test_literal_segments_escaped() {
        let mut router = Router::new();
        router
            .add_route("/v1.0/ping", def("ping", Method::GET, "/v1.0/ping"))
            .unwrap();
        assert!(router.route(&Method::GET, "/v1.0/ping").is_some());
        assert!(router.route(&Method::GET, "/v1x0/ping").is_none());
    }
}
