//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! A [`Pipeline`](crate::Pipeline) holds exactly one endpoint handler, but
//! every pipeline has a different handler type. The handler is erased behind
//! `dyn ErasedHandler` so the pipeline type stays nameable:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ Pipeline::new(hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req).await.into_outcome() })
//! ```
//!
//! # What a handler can return
//!
//! Anything implementing [`Reply`]. Besides plain responses that covers the
//! failure shapes the error middleware cares about:
//!
//! | Return value | Effect on the request |
//! |---|---|
//! | `Response`, `StatusCode`, `String`, `&'static str` | response written |
//! | `Err(e)` from a `Result<_, E>` | `e` attached to the error list |
//! | `()` or `None` | nothing written |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
pub type BoxFuture<'a, T = ()> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Internal dispatch interface.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Outcome>;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Outcome / Reply ───────────────────────────────────────────────────────────

/// What a handler did with its request.
pub enum Outcome {
    Respond(Response),
    Fail(BoxError),
    Nothing,
}

impl Outcome {
    /// Records the outcome on the request context.
    pub(crate) fn apply(self, cx: &mut Context) {
        match self {
            Self::Respond(res) => { cx.respond(res); }
            Self::Fail(err) => cx.attach_error(err),
            Self::Nothing => {}
        }
    }
}

/// Conversion of a handler's return value into an [`Outcome`].
pub trait Reply {
    fn into_outcome(self) -> Outcome;
}

macro_rules! reply_via_into_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reply for $ty {
                fn into_outcome(self) -> Outcome {
                    Outcome::Respond(self.into_response())
                }
            }
        )*
    };
}

reply_via_into_response!(Response, StatusCode, String, &'static str);

impl Reply for () {
    fn into_outcome(self) -> Outcome { Outcome::Nothing }
}

impl<R: Reply> Reply for Option<R> {
    fn into_outcome(self) -> Outcome {
        self.map_or(Outcome::Nothing, Reply::into_outcome)
    }
}

impl<R, E> Reply for Result<R, E>
where
    R: Reply,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(r) => r.into_outcome(),
            Err(e) => Outcome::Fail(e.into()),
        }
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid endpoint handler.
///
/// Automatically satisfied for any `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl Reply
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Reply + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Reply + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: Reply + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Outcome> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}
