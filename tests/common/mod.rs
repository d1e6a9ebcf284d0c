//! Shared utilities for the integration tests.

use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, Method, Version};
use mend::{Context, RequestHead};
use tracing::subscriber::DefaultGuard;
use tracing::{Dispatch, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log sink. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Installs a plain-text `fmt` subscriber writing into a fresh capture as
    /// this thread's default. Logs are captured until the guard is dropped.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let guard = tracing::subscriber::set_default(capture.subscriber());
        (capture, guard)
    }

    /// A fresh capture and its subscriber as a [`Dispatch`], for futures
    /// that run on other worker threads (`WithSubscriber::with_subscriber`).
    #[allow(dead_code)]
    pub fn dispatch() -> (Self, Dispatch) {
        let capture = Self::default();
        let dispatch = Dispatch::new(capture.subscriber());
        (capture, dispatch)
    }

    fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Captured lines at ERROR level.
    #[allow(dead_code)]
    pub fn errors(&self) -> Vec<String> {
        self.contents()
            .split('\n')
            .filter(|l| l.contains("ERROR"))
            .map(str::to_owned)
            .collect()
    }
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.0))
    }
}

/// A `GET` context for `path` with the given headers.
pub fn context(path: &str, headers: &[(&'static str, &str)]) -> Context {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(*name, value.parse().unwrap());
    }
    let head = RequestHead::new(Method::GET, path.parse().unwrap(), Version::HTTP_11, map);
    Context::new(head, Bytes::new())
}

/// Parses the response body written to `cx` as JSON.
pub fn body_json(cx: &Context) -> serde_json::Value {
    serde_json::from_slice(cx.response().expect("no response written").body()).unwrap()
}
