//! Per-request logger resolution.
//!
//! A logger here is a [`tracing::Span`]: the guards emit their events with
//! the resolved span as explicit parent, so every event carries the
//! request's tracing context (request id, trace id, whatever the span was
//! created with).
//!
//! Two strategies, picked when the middleware is constructed:
//!
//! - **Factory** — a [`LoggerFactory`] called with the request
//!   [`Context`]. Closures `Fn(&Context) -> Span` qualify.
//! - **Provider** — an earlier middleware stores an
//!   `Arc<dyn LoggerProvider>` in the context under a known key; the guard
//!   looks it up per request.
//!
//! Resolution never fails. A missing provider, a value of the wrong type
//! under the key, or a factory that panics all yield the default span the
//! middleware was built with.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::Span;

use crate::context::Context;
use crate::panic::discard_backtrace;

/// Key the provider strategy reads unless told otherwise.
pub const DEFAULT_PROVIDER_KEY: &str = "mend.logger_provider";

/// Builds a logger for one request.
pub trait LoggerFactory: Send + Sync + 'static {
    fn new_logger(&self, cx: &Context) -> Span;
}

impl<F> LoggerFactory for F
where
    F: Fn(&Context) -> Span + Send + Sync + 'static,
{
    fn new_logger(&self, cx: &Context) -> Span {
        self(cx)
    }
}

/// A request-scoped service that hands out the request's logger.
///
/// Store one in the context as `Arc<dyn LoggerProvider>`:
///
/// ```rust
/// # use std::sync::Arc;
/// # use mend::{Context, LoggerProvider, DEFAULT_PROVIDER_KEY};
/// struct Scoped(tracing::Span);
///
/// impl LoggerProvider for Scoped {
///     fn logger(&self) -> tracing::Span { self.0.clone() }
/// }
///
/// fn attach(cx: &mut Context, span: tracing::Span) {
///     let provider: Arc<dyn LoggerProvider> = Arc::new(Scoped(span));
///     cx.set(DEFAULT_PROVIDER_KEY, provider);
/// }
/// ```
pub trait LoggerProvider: Send + Sync {
    fn logger(&self) -> Span;
}

/// How a guard obtains its per-request logger.
#[derive(Clone)]
pub enum LoggerSource {
    Factory(Arc<dyn LoggerFactory>),
    Provider { key: String },
    /// No per-request resolution; always the default span.
    Fallback,
}

impl LoggerSource {
    pub fn factory(factory: impl LoggerFactory) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// Provider lookup under [`DEFAULT_PROVIDER_KEY`].
    pub fn provider() -> Self {
        Self::provider_at(DEFAULT_PROVIDER_KEY)
    }

    pub fn provider_at(key: impl Into<String>) -> Self {
        Self::Provider { key: key.into() }
    }

    /// Resolves the logger for `cx`, or returns a clone of `default`.
    pub fn resolve(&self, cx: &Context, default: &Span) -> Span {
        let resolved = match self {
            Self::Factory(factory) => {
                panic::catch_unwind(AssertUnwindSafe(|| factory.new_logger(cx))).ok()
            }
            Self::Provider { key } => cx
                .get::<Arc<dyn LoggerProvider>>(key)
                .and_then(|p| panic::catch_unwind(AssertUnwindSafe(|| p.logger())).ok()),
            Self::Fallback => None,
        };
        resolved.unwrap_or_else(|| {
            discard_backtrace();
            default.clone()
        })
    }
}

impl Default for LoggerSource {
    fn default() -> Self { Self::Fallback }
}

impl std::fmt::Debug for LoggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Provider { key } => f.debug_struct("Provider").field("key", key).finish(),
            Self::Fallback => f.write_str("Fallback"),
        }
    }
}
