//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// Method, URI, and headers of a request.
///
/// Shared behind an `Arc` so the error-handling middleware can keep a handle
/// on it while the request itself is moved down the chain.
#[derive(Debug)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
}

impl RequestHead {
    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// An incoming HTTP request with its body fully read.
#[derive(Debug)]
pub struct Request {
    pub(crate) head: Arc<RequestHead>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub fn head(&self) -> &Arc<RequestHead> { &self.head }
    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/{repo}/+log`, `req.param("repo")` on `/kernel/+log` returns `Some("kernel")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let head = RequestHead { method: parts.method, uri: parts.uri, headers: parts.headers };
        Self { head: Arc::new(head), body, params: HashMap::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_http_request() {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("/kernel/+log?n=5")
            .header("X-Request-Id", "r-1")
            .body(Bytes::from_static(b"payload"))
            .map(Request::from)
            .unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/kernel/+log");
        assert_eq!(req.header("x-request-id"), Some("r-1"));
        assert_eq!(req.body(), b"payload");
        assert_eq!(req.param("repo"), None);
    }
}
