//! Per-request state shared by middleware and the handler.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::BoxError;
use crate::request::{Request, RequestHead};
use crate::response::Response;

/// Everything the pipeline knows about one in-flight request.
///
/// A `Context` is created by the server for each request, threaded through
/// every [`Middleware`](crate::middleware::Middleware) as `&mut Context`, and
/// turned into the wire response once the pipeline returns. It is never
/// shared between requests.
///
/// It carries:
/// - the request head and body,
/// - keyed storage for values earlier middleware attach (`set` / `get`),
/// - the ordered, append-only list of errors handlers attached,
/// - the response slot, written at most once,
/// - the abort flag.
pub struct Context {
    head: Arc<RequestHead>,
    body: Bytes,
    keys: HashMap<String, Arc<dyn Any + Send + Sync>>,
    errors: Vec<BoxError>,
    response: Option<Response>,
    aborted: bool,
}

impl Context {
    pub fn new(head: RequestHead, body: Bytes) -> Self {
        Self {
            head: Arc::new(head),
            body,
            keys: HashMap::new(),
            errors: Vec::new(),
            response: None,
            aborted: false,
        }
    }

    pub fn head(&self) -> &RequestHead { &self.head }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The handler's view of this request. Cheap: the head is shared and the
    /// body is reference counted.
    pub fn request(&self) -> Request {
        Request::new(Arc::clone(&self.head), self.body.clone())
    }

    // ── Keyed storage ─────────────────────────────────────────────────────────

    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.keys.insert(key.into(), Arc::new(value));
    }

    /// Returns the value stored under `key` if it exists and is a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.keys.get(key)?.downcast_ref::<T>()
    }

    // ── Error list ────────────────────────────────────────────────────────────

    /// Appends an error to the request's error list.
    pub fn attach_error(&mut self, err: impl Into<BoxError>) {
        self.errors.push(err.into());
    }

    /// Attached errors in the order they were attached.
    pub fn errors(&self) -> &[BoxError] { &self.errors }

    // ── Response slot ─────────────────────────────────────────────────────────

    /// Writes the response. Returns `false`, leaving the first response in
    /// place, if one was already written.
    pub fn respond(&mut self, response: Response) -> bool {
        if self.response.is_some() {
            tracing::debug!(
                status = response.status_code().as_u16(),
                "response already written, discarding",
            );
            return false;
        }
        self.response = Some(response);
        true
    }

    pub fn written(&self) -> bool { self.response.is_some() }
    pub fn response(&self) -> Option<&Response> { self.response.as_ref() }
    pub fn take_response(&mut self) -> Option<Response> { self.response.take() }

    // ── Abort ─────────────────────────────────────────────────────────────────

    /// Marks the connection for closing without sending a response.
    pub fn abort(&mut self) { self.aborted = true; }
    pub fn is_aborted(&self) -> bool { self.aborted }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, Method, StatusCode, Version};

    use super::*;

    fn cx() -> Context {
        let head = RequestHead::new(Method::GET, "/".parse().unwrap(), Version::HTTP_11, HeaderMap::new());
        Context::new(head, Bytes::new())
    }

    #[test]
    fn second_write_is_refused() {
        let mut cx = cx();
        assert!(cx.respond(Response::status(StatusCode::CREATED)));
        assert!(!cx.respond(Response::status(StatusCode::INTERNAL_SERVER_ERROR)));
        assert_eq!(cx.response().unwrap().status_code(), StatusCode::CREATED);
    }

    #[test]
    fn get_checks_stored_type() {
        let mut cx = cx();
        cx.set("n", 7_u32);
        assert_eq!(cx.get::<u32>("n"), Some(&7));
        assert_eq!(cx.get::<String>("n"), None);
        assert_eq!(cx.get::<u32>("missing"), None);
    }

    #[test]
    fn errors_keep_attachment_order() {
        let mut cx = cx();
        cx.attach_error("first");
        cx.attach_error(String::from("second"));
        let seen: Vec<String> = cx.errors().iter().map(ToString::to_string).collect();
        assert_eq!(seen, ["first", "second"]);
    }
}
