//! Middleware layer.
//!
//! Middleware intercepts a request on its way to the handler and sees the
//! [`Context`] again once the handler is done. Each layer receives the
//! context and a [`Next`] continuation; calling `next.run(cx)` runs every
//! layer inside it and finally the handler.
//!
//! Built-in middleware, listed outermost first:
//!
//! | Layer | Catches | Writes |
//! |---|---|---|
//! | [`RootRecovery`] | panics escaping every other layer | fixed `500` body |
//! | [`Recovery`] | panics escaping the handler chain | classified response, or aborts |
//! | [`ErrorResolution`] | errors attached by the handler chain | classified response |
//!
//! [`Pipeline::with_guards`](crate::Pipeline::with_guards) installs all three
//! in that order.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler};

mod classify;
mod error_resolution;
mod recovery;
mod root;

pub use classify::Classification;
pub use error_resolution::ErrorResolution;
pub use recovery::Recovery;
pub use root::{RootRecovery, ROOT_FALLBACK_BODY};

/// A request interceptor.
///
/// ```rust
/// use mend::{BoxFuture, Context};
/// use mend::middleware::{Middleware, Next};
///
/// struct Tag;
///
/// impl Middleware for Tag {
///     fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
///         Box::pin(async move {
///             cx.set("tagged", true);
///             next.run(cx).await;
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, cx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a>;
}

/// The rest of the pipeline, from the current layer inwards.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stack: &'a [Arc<dyn Middleware>], endpoint: &'a BoxedHandler) -> Self {
        Self { stack, endpoint }
    }

    /// Runs the remaining layers and the handler.
    ///
    /// All work, including the first layer's synchronous setup and the
    /// handler call itself, happens when the returned future is polled, so a
    /// caller wrapping the future in `catch_unwind` sees every panic.
    pub fn run<'b>(self, cx: &'b mut Context) -> BoxFuture<'b>
    where
        'a: 'b,
    {
        Box::pin(async move {
            match self.stack.split_first() {
                Some((layer, rest)) => layer.handle(cx, Next::new(rest, self.endpoint)).await,
                None => {
                    let outcome = self.endpoint.call(cx.request()).await;
                    outcome.apply(cx);
                }
            }
        })
    }
}
