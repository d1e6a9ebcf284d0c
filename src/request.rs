//! Incoming HTTP request types.

use std::fmt::Write as _;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, Version};

/// Method, target, version and headers of a request. No body.
///
/// Shared behind an `Arc` between the [`Context`](crate::Context) and the
/// handler's [`Request`], so the recovery middleware can still describe the
/// request after the handler has panicked.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) version: Version,
    pub(crate) headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap) -> Self {
        Self { method, uri, version, headers }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn version(&self) -> Version { self.version }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Raw HTTP/1.x rendering of the request line and headers, body omitted.
    ///
    /// Header names are canonicalised (`content-type` → `Content-Type`) and
    /// every line, including the trailing blank one, ends in CRLF:
    ///
    /// ```text
    /// GET /users/42 HTTP/1.1\r\n
    /// Host: api.local\r\n
    /// Authorization: Bearer xyz\r\n
    /// \r\n
    /// ```
    ///
    /// Never log this directly; pass it through
    /// [`redact_headers`](crate::redact::redact_headers) first.
    pub fn dump(&self) -> String {
        let target = self.uri.path_and_query().map_or("/", |pq| pq.as_str());
        let mut out = format!("{} {} {:?}\r\n", self.method, target, self.version);
        for (name, value) in &self.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            let _ = write!(out, "{}: {}\r\n", canonical_name(name.as_str()), value);
        }
        out.push_str("\r\n");
        out
    }
}

/// `x-request-id` → `X-Request-Id`.
fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// The handler's read-only view of an incoming request.
pub struct Request {
    pub(crate) head: Arc<RequestHead>,
    pub(crate) body: Bytes,
}

impl Request {
    pub(crate) fn new(head: Arc<RequestHead>, body: Bytes) -> Self {
        Self { head, body }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head() -> RequestHead {
        let mut headers = HeaderMap::new();
        headers.insert("host", "api.local".parse().unwrap());
        headers.insert("x-request-id", "abc".parse().unwrap());
        RequestHead::new(
            Method::POST,
            "/users?id=42".parse().unwrap(),
            Version::HTTP_11,
            headers,
        )
    }

    #[test]
    fn dump_renders_request_line_and_canonical_headers() {
        assert_eq!(
            head().dump(),
            "POST /users?id=42 HTTP/1.1\r\nHost: api.local\r\nX-Request-Id: abc\r\n\r\n"
        );
    }

    #[test]
    fn request_exposes_head_and_body() {
        let req = Request::new(Arc::new(head()), Bytes::from_static(b"{}"));
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(req.body(), b"{}");
    }
}
