//! Transport-neutral HTTP request and response

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use oscquery_core::PATH_NOT_FOUND;
use std::net::SocketAddr;

/// An incoming request, reduced to what the pipeline needs
#[derive(Debug, Clone)]
pub struct OscQueryRequest {
    pub method: Method,
    /// Request path, e.g. `/avatar/parameters`
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    /// Observed address of the caller
    pub remote_addr: Option<SocketAddr>,
}

impl OscQueryRequest {
    /// Build a GET request from a path with an optional query, e.g. `/?HOST_INFO`
    pub fn get(path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (path_and_query, None),
        };
        Self {
            method: Method::GET,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            remote_addr: None,
        }
    }

    /// Build a request from the parts of an HTTP request line. The path is
    /// percent-decoded; one that does not decode to UTF-8 is kept as sent.
    pub fn from_parts(method: Method, uri: &Uri, remote_addr: Option<SocketAddr>) -> Self {
        let path = match urlencoding::decode(uri.path()) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => uri.path().to_string(),
        };
        Self {
            method,
            path,
            query: uri.query().map(str::to_string),
            remote_addr,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// True if the query string carries `key`, with or without a value
    pub fn has_query_key(&self, key: &str) -> bool {
        self.query
            .as_deref()
            .map(|q| {
                q.split('&')
                    .map(|pair| pair.split_once('=').map_or(pair, |(k, _)| k))
                    .any(|k| k == key)
            })
            .unwrap_or(false)
    }
}

/// Response being built by the pipeline
#[derive(Debug, Clone)]
pub struct OscQueryResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OscQueryResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// 200 with an uncached body of the given content type
    pub fn set_body(&mut self, content_type: &'static str, body: impl Into<Bytes>) {
        self.status = StatusCode::OK;
        self.headers
            .insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into();
    }

    pub fn set_json(&mut self, body: impl Into<Bytes>) {
        self.set_body("application/json", body);
    }

    pub fn set_not_found(&mut self) {
        self.status = StatusCode::NOT_FOUND;
        self.headers.remove(header::PRAGMA);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.body = Bytes::from_static(PATH_NOT_FOUND.as_bytes());
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

impl Default for OscQueryResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for OscQueryResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Request and response travelling through the middleware chain
#[derive(Debug, Clone)]
pub struct HttpContext {
    pub request: OscQueryRequest,
    pub response: OscQueryResponse,
}

impl HttpContext {
    pub fn new(request: OscQueryRequest) -> Self {
        Self {
            request,
            response: OscQueryResponse::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_splits_query() {
        let req = OscQueryRequest::get("/?HOST_INFO");
        assert_eq!(req.path, "/");
        assert_eq!(req.query.as_deref(), Some("HOST_INFO"));

        let req = OscQueryRequest::get("/avatar");
        assert_eq!(req.path, "/avatar");
        assert!(req.query.is_none());
    }

    #[test]
    fn test_query_key_matching() {
        assert!(OscQueryRequest::get("/?HOST_INFO").has_query_key("HOST_INFO"));
        assert!(OscQueryRequest::get("/?a=1&HOST_INFO=yes").has_query_key("HOST_INFO"));
        assert!(!OscQueryRequest::get("/?HOST_INFOX").has_query_key("HOST_INFO"));
        assert!(!OscQueryRequest::get("/?x=HOST_INFO").has_query_key("HOST_INFO"));
        assert!(!OscQueryRequest::get("/HOST_INFO").has_query_key("HOST_INFO"));
    }

    #[test]
    fn test_from_parts_decodes_path() {
        let uri: Uri = "/avatar/My%20Param?HOST_INFO".parse().unwrap();
        let req = OscQueryRequest::from_parts(Method::GET, &uri, None);
        assert_eq!(req.path, "/avatar/My Param");
        assert_eq!(req.query.as_deref(), Some("HOST_INFO"));

        let uri: Uri = "/caf%C3%A9".parse().unwrap();
        assert_eq!(
            OscQueryRequest::from_parts(Method::GET, &uri, None).path,
            "/café"
        );

        let uri: Uri = "/bad%FF".parse().unwrap();
        assert_eq!(
            OscQueryRequest::from_parts(Method::GET, &uri, None).path,
            "/bad%FF"
        );
    }

    #[test]
    fn test_not_found_body() {
        let mut res = OscQueryResponse::new();
        res.set_not_found();
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body_str(), Some("OSC Path not found"));
    }
}
