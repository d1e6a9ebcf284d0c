//! Middleware stack plus endpoint handler.

use std::sync::Arc;

use tracing::Span;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::logger::LoggerSource;
use crate::middleware::{ErrorResolution, Middleware, Next, Recovery, RootRecovery};

/// An endpoint handler wrapped in middleware.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each [`wrap`](Pipeline::wrap) adds a layer *inside* the ones already
/// added, so the first layer wrapped is the outermost.
///
/// ```rust
/// use mend::{LoggerSource, Pipeline, Request, Response};
///
/// async fn hello(_req: Request) -> Response { Response::text("hello") }
///
/// let app = Pipeline::with_guards(hello, LoggerSource::Fallback, tracing::Span::none());
/// ```
pub struct Pipeline {
    stack: Vec<Arc<dyn Middleware>>,
    endpoint: BoxedHandler,
}

impl Pipeline {
    pub fn new(handler: impl Handler) -> Self {
        Self { stack: Vec::new(), endpoint: handler.into_boxed_handler() }
    }

    /// The standard guard stack around `handler`:
    /// [`RootRecovery`] → [`Recovery`] → [`ErrorResolution`] → handler.
    ///
    /// `default_logger` is the root guard's only logger and the fallback for
    /// the other two whenever `source` yields nothing.
    pub fn with_guards(handler: impl Handler, source: LoggerSource, default_logger: Span) -> Self {
        Self::new(handler)
            .wrap(RootRecovery::new(default_logger.clone()))
            .wrap(Recovery::new(source.clone(), default_logger.clone()))
            .wrap(ErrorResolution::new(source, default_logger))
    }

    /// Adds `middleware` inside every layer added so far.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    /// Runs `cx` through every layer and the handler.
    pub async fn call(&self, cx: &mut Context) {
        Next::new(&self.stack, &self.endpoint).run(cx).await;
    }
}
