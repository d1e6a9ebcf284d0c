//! Post-handler error resolution.

use tracing::Span;

use crate::api_error::ApiError;
use crate::context::Context;
use crate::handler::BoxFuture;
use crate::logger::LoggerSource;
use crate::middleware::{Classification, Middleware, Next};
use crate::response::IntoResponse;

/// Turns the errors a handler chain attached to its request into the
/// response.
///
/// Runs after the inner layers return without panicking:
///
/// - errors attached → all of them are logged in one event; the first
///   [`ApiError`] is answered with its own status, otherwise the last error
///   is answered as a `500` `UnexpectedError`;
/// - no errors and no response → logged, answered with `500` `UnsetResponse`
///   (code 11001);
/// - no errors and a response → untouched.
///
/// A response the handler already wrote is never replaced.
pub struct ErrorResolution {
    source: LoggerSource,
    default_logger: Span,
}

impl ErrorResolution {
    pub fn new(source: LoggerSource, default_logger: Span) -> Self {
        Self { source, default_logger }
    }

    fn resolve(&self, cx: &mut Context) {
        let Some(outcome) = Classification::of_errors(cx.errors(), cx.written()) else {
            return;
        };
        let logger = self.source.resolve(cx, &self.default_logger);

        let response = match outcome {
            Classification::UnsetResponse => {
                tracing::error!(parent: &logger, "no response was written");
                ApiError::unset_response()
            }
            Classification::Structured(err) => {
                log_errors(cx, &logger);
                err
            }
            other => {
                log_errors(cx, &logger);
                ApiError::unexpected(other)
            }
        };
        cx.respond(response.into_response());
    }
}

fn log_errors(cx: &Context, logger: &Span) {
    let errors: Vec<String> = cx.errors().iter().map(ToString::to_string).collect();
    tracing::error!(parent: logger, error = ?errors, "errors processing request");
}

impl Middleware for ErrorResolution {
    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            next.run(&mut *cx).await;
            self.resolve(cx);
        })
    }
}
