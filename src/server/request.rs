use crate::reply::HeaderVec;
use crate::router::ParamVec;
use http::Method;
use may_minihttp::Request;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Raw HTTP request data extracted for the processing pipeline.
#[derive(Debug)]
pub struct ParsedRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Headers with lowercase names (stack-allocated for <=16 headers).
    pub headers: HeaderVec,
    /// Cookies from the Cookie header.
    pub cookies: HeaderVec,
    /// Decoded query string parameters.
    pub query_params: ParamVec,
    /// Unparsed payload bytes; JSON/form decoding happens later in the
    /// parsing stage.
    pub body: Vec<u8>,
}

impl ParsedRequest {
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Split the Cookie header into name/value pairs.
#[must_use]
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    let mut cookies = HeaderVec::new();
    let Some(raw) = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .map(|(_, v)| v.as_str())
    else {
        return cookies;
    };
    for pair in raw.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let Some(name) = parts.next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let value = parts.next().unwrap_or("").trim().to_string();
        cookies.push((Arc::from(name.trim()), value));
    }
    cookies
}

/// Decode the query string after `?`, URL-unescaping names and values.
#[must_use]
pub fn parse_query_params(raw_path: &str) -> ParamVec {
    let mut params = ParamVec::new();
    if let Some(pos) = raw_path.find('?') {
        for (k, v) in url::form_urlencoded::parse(raw_path[pos + 1..].as_bytes()) {
            params.push((Arc::from(k.as_ref()), v.to_string()));
        }
    }
    params
}

/// Extract method, path, headers, cookies, query params, and payload bytes
/// from a raw `may_minihttp` request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method =
        Method::from_bytes(req.method().as_bytes()).unwrap_or(Method::GET);
    let raw_path = req.path().to_string();
    let path = raw_path
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();

    let mut headers = HeaderVec::new();
    for h in req.headers() {
        headers.push((
            Arc::from(h.name.to_ascii_lowercase().as_str()),
            String::from_utf8_lossy(h.value).to_string(),
        ));
    }

    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);

    let mut body = Vec::new();
    let _ = req.body().read_to_end(&mut body);

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        cookie_count = cookies.len(),
        query_count = query_params.len(),
        body_bytes = body.len(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("cookie"), "a=b; c=d".to_string()));
        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].1, "b");
        assert_eq!(cookies[1].1, "d");
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=hello%20world");
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].0.as_ref(), "x");
        assert_eq!(q[0].1, "1");
        assert_eq!(q[1].1, "hello world");
    }

    #[test]
    fn test_parse_query_params_none() {
        assert!(parse_query_params("/p").is_empty());
    }
}
