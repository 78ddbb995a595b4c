use super::Middleware;
use crate::dispatcher::HandlerRequest;
use crate::reply::{Reply, ReplyPayload};
use http::Method;
use serde_json::Value;

/// CORS middleware: answers preflight OPTIONS requests early and decorates
/// outgoing replies with the configured access-control headers.
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsMiddleware {
    #[must_use]
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    /// Add the access-control headers to a finished reply. Called by the
    /// server during the sending stage for non-preflight requests.
    pub fn apply(&self, payload: &mut ReplyPayload) {
        payload.set_header(
            "Access-Control-Allow-Origin",
            self.allowed_origins.join(", "),
        );
        payload.set_header(
            "Access-Control-Allow-Headers",
            self.allowed_headers.join(", "),
        );
        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        payload.set_header("Access-Control-Allow-Methods", methods);
    }
}

/// Permissive defaults for development; production should restrict origins
/// via [`CorsMiddleware::new`].
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ],
        }
    }
}

impl Middleware for CorsMiddleware {
    fn call(&self, req: &HandlerRequest, reply: &Reply) -> anyhow::Result<Option<ReplyPayload>> {
        if req.method == Method::OPTIONS {
            let mut payload = reply.custom(204, Value::Null);
            self.apply(&mut payload);
            Ok(Some(payload))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ReplySender;
    use crate::ids::RequestId;
    use crate::reply::HeaderVec;
    use crate::router::ParamVec;
    use serde_json::json;

    fn request(method: Method) -> (HandlerRequest, ReplySender) {
        let (tx, _rx) = may::sync::mpsc::channel();
        let req = HandlerRequest {
            request_id: RequestId::new(),
            method,
            url: "/x".into(),
            path: "/x".into(),
            route_name: "x".into(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            params: json!({}),
            query: json!({}),
            body: None,
            raw_body: None,
            transfer_encoding: None,
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            reply_tx: tx.clone(),
        };
        (req, tx)
    }

    #[test]
    fn test_preflight_short_circuits() {
        let cors = CorsMiddleware::default();
        let (req, _tx) = request(Method::OPTIONS);
        let payload = cors.call(&req, &Reply::new()).unwrap().unwrap();
        assert_eq!(payload.status, 204);
        assert_eq!(payload.get_header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_non_preflight_continues() {
        let cors = CorsMiddleware::default();
        let (req, _tx) = request(Method::GET);
        assert!(cors.call(&req, &Reply::new()).unwrap().is_none());
    }

    #[test]
    fn test_apply_sets_headers() {
        let cors = CorsMiddleware::new(
            vec!["https://example.com".into()],
            vec!["Content-Type".into()],
            vec![Method::GET],
        );
        let mut payload = Reply::new().success(200, Value::Null);
        cors.apply(&mut payload);
        assert_eq!(
            payload.get_header("Access-Control-Allow-Origin"),
            Some("https://example.com")
        );
        assert_eq!(payload.get_header("Access-Control-Allow-Methods"), Some("GET"));
    }
}
