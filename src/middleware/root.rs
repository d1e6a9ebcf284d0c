//! Last-resort panic handler.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::Span;

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::panic::{fresh_backtrace, install_hook, panic_message, take_backtrace};
use crate::response::Response;

/// Body written for any panic that reaches [`RootRecovery`].
pub const ROOT_FALLBACK_BODY: &str =
    r#"{"errorCode":10000,"errorMessage":"UnexpectedError","errorDetail":"panic reached root"}"#;

/// Outermost guard. A panic getting this far is a bug in the layers below
/// it, including this crate's own middleware.
///
/// No classification and no per-request logger: one fixed span, one fixed
/// `500` body.
pub struct RootRecovery {
    logger: Span,
}

impl RootRecovery {
    pub fn new(logger: Span) -> Self {
        install_hook();
        Self { logger }
    }
}

impl Middleware for RootRecovery {
    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            let inner = fresh_backtrace(next.run(&mut *cx));
            let Err(payload) = AssertUnwindSafe(inner).catch_unwind().await else {
                return;
            };
            tracing::error!(
                parent: &self.logger,
                error = %panic_message(&*payload),
                stack = %take_backtrace(),
                "panic reached root handling"
            );
            cx.respond(
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(ROOT_FALLBACK_BODY),
            );
        })
    }
}
