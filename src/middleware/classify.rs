//! Classification of recovered panics and attached request errors.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use crate::api_error::ApiError;
use crate::error::BoxError;
use crate::panic::panic_message;

/// What went wrong with a request, as far as the response is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A known application error; answered with its own status and body.
    Structured(ApiError),
    /// The client went away mid-request. Carries the I/O error message.
    BrokenPipe(String),
    /// Anything else. Carries a rendering of the original value.
    Unexpected(String),
    /// The handler chain returned without responding or failing.
    UnsetResponse,
}

impl Classification {
    /// Classifies a payload recovered from a panic.
    pub fn of_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(err) = payload.downcast_ref::<ApiError>() {
            return Self::Structured(err.clone());
        }
        if let Some(msg) = broken_pipe(payload) {
            return Self::BrokenPipe(msg);
        }
        Self::Unexpected(panic_message(payload))
    }

    /// Classifies the errors a handler chain attached to its request.
    ///
    /// The **first** [`ApiError`] in the list wins; later ones never override
    /// it. Without any, the **last** entry is reported as unexpected. An empty
    /// list is [`UnsetResponse`](Self::UnsetResponse) when nothing was
    /// written and `None` (success) otherwise.
    pub fn of_errors(errors: &[BoxError], written: bool) -> Option<Self> {
        let Some(last) = errors.last() else {
            return (!written).then_some(Self::UnsetResponse);
        };
        let first_structured = errors.iter().find_map(|e| e.downcast_ref::<ApiError>());
        Some(match first_structured {
            Some(err) => Self::Structured(err.clone()),
            None => Self::Unexpected(last.to_string()),
        })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(err) => write!(f, "{err}"),
            Self::BrokenPipe(msg) | Self::Unexpected(msg) => f.write_str(msg),
            Self::UnsetResponse => f.write_str("UnsetResponse"),
        }
    }
}

/// Returns the message of the I/O error behind `payload` if it reports a
/// disconnected peer.
///
/// The payload may be the `io::Error` itself, or a `hyper::Error` or boxed
/// error with one somewhere in its source chain.
fn broken_pipe(payload: &(dyn Any + Send)) -> Option<String> {
    let root: &(dyn StdError + 'static) = if let Some(e) = payload.downcast_ref::<std::io::Error>() {
        e
    } else if let Some(e) = payload.downcast_ref::<hyper::Error>() {
        e
    } else if let Some(e) = payload.downcast_ref::<BoxError>() {
        &**e
    } else {
        return None;
    };

    let mut current = Some(root);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            let msg = io.to_string();
            let lower = msg.to_lowercase();
            if lower.contains("broken pipe") || lower.contains("connection reset by peer") {
                return Some(msg);
            }
        }
        current = err.source();
    }
    None
}
