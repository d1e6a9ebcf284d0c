//! Panic recovery for the handler chain.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::Span;

use crate::api_error::ApiError;
use crate::context::Context;
use crate::handler::BoxFuture;
use crate::logger::LoggerSource;
use crate::middleware::{Classification, Middleware, Next};
use crate::panic::{fresh_backtrace, install_hook, panic_message, take_backtrace};
use crate::redact::redact_headers;
use crate::response::IntoResponse;

/// Catches panics escaping the inner layers and answers them.
///
/// | Panic value | Logged | Result |
/// |---|---|---|
/// | [`ApiError`] | no | its own status and body |
/// | I/O error: broken pipe / connection reset by peer | headers, error | connection aborted, no body |
/// | anything else | headers, error, stack | `500` `UnexpectedError` |
///
/// Logged headers come from the request dump with `Authorization` masked.
/// The logger comes from the [`LoggerSource`]; when it yields nothing the
/// default span given at construction is used.
///
/// To carry an [`ApiError`] out of a handler by panicking, use
/// `std::panic::panic_any(err)`.
pub struct Recovery {
    source: LoggerSource,
    default_logger: Span,
}

impl Recovery {
    pub fn new(source: LoggerSource, default_logger: Span) -> Self {
        install_hook();
        Self { source, default_logger }
    }

    fn recover(&self, cx: &mut Context, payload: Box<dyn Any + Send>) {
        let trace = take_backtrace();

        let outcome = match Classification::of_panic(&*payload) {
            Classification::Structured(err) => {
                cx.respond(err.into_response());
                return;
            }
            other => other,
        };

        let logger = self.source.resolve(cx, &self.default_logger);
        let headers = redact_headers(&cx.head().dump());

        if let Classification::BrokenPipe(_) = outcome {
            tracing::error!(
                parent: &logger,
                headers = %headers,
                error = %panic_message(&*payload),
                "panic recovered, broken pipe"
            );
            cx.abort();
            return;
        }

        tracing::error!(
            parent: &logger,
            headers = %headers,
            error = %outcome,
            stack = %trace,
            "panic recovered"
        );
        cx.respond(ApiError::unexpected(outcome).into_response());
    }
}

impl Middleware for Recovery {
    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            let inner = fresh_backtrace(next.run(&mut *cx));
            if let Err(payload) = AssertUnwindSafe(inner).catch_unwind().await {
                self.recover(cx, payload);
            }
        })
    }
}
