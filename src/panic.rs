//! Panic payload inspection and panic-site stack capture.
//!
//! By the time `catch_unwind` hands a payload back, the panicking frames are
//! gone. A panic hook captures the backtrace while they still exist and parks
//! it in a thread-local slot; the guard that caught the unwind takes it on
//! the same thread right after.
//!
//! The slot is shared by everything that runs on the worker thread, so
//! guards poll their inner future through [`fresh_backtrace`], which empties
//! it first. A trace taken after an unwind then comes from that poll or from
//! nowhere.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic;
use std::sync::Once;

use futures_util::future::poll_fn;

use crate::api_error::ApiError;
use crate::error::BoxError;
use crate::handler::BoxFuture;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Installs the capturing panic hook, chained in front of whatever hook was
/// set before. Idempotent.
pub(crate) fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture();
            let _ = LAST_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(trace));
            if is_reported(info.payload()) {
                previous(info);
            }
        }));
    });
}

/// Whether the previous hook hears about a panic with this payload.
/// [`ApiError`] panics are answered, not reported.
fn is_reported(payload: &(dyn Any + Send)) -> bool {
    !payload.is::<ApiError>()
}

/// Drops whatever backtrace is parked on this thread.
pub(crate) fn discard_backtrace() {
    let _ = LAST_BACKTRACE.try_with(|slot| slot.borrow_mut().take());
}

/// Polls `fut`, emptying this thread's backtrace slot before every poll.
pub(crate) fn fresh_backtrace<'a>(mut fut: BoxFuture<'a>) -> impl Future<Output = ()> + Send + 'a {
    poll_fn(move |task| {
        discard_backtrace();
        fut.as_mut().poll(task)
    })
}

/// Takes the backtrace of the most recent panic on this thread, or captures
/// one here if the hook saw none.
pub(crate) fn take_backtrace() -> Backtrace {
    LAST_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(Backtrace::force_capture)
}

/// Human-readable rendering of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(e) = payload.downcast_ref::<ApiError>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<std::io::Error>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<BoxError>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<hyper::Error>() {
        e.to_string()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_common_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*s), "boom");

        let s: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(&*s), "owned boom");

        let s: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*s), "Box<dyn Any>");
    }

    #[test]
    fn hook_parks_backtrace_for_this_thread() {
        install_hook();
        let caught = panic::catch_unwind(|| -> u8 { panic!("captured") });
        assert!(caught.is_err());
        assert!(LAST_BACKTRACE.with(|slot| slot.borrow().is_some()));
        let _ = take_backtrace();
        assert!(LAST_BACKTRACE.with(|slot| slot.borrow().is_none()));
    }

    #[test]
    fn structured_panics_skip_the_previous_hook() {
        let err = ApiError::new(4, "NotFound", http::StatusCode::NOT_FOUND, "");
        let structured: Box<dyn Any + Send> = Box::new(err);
        assert!(!is_reported(&*structured));

        let plain: Box<dyn Any + Send> = Box::new("boom");
        assert!(is_reported(&*plain));
    }

    #[tokio::test]
    async fn fresh_backtrace_clears_a_parked_trace_before_polling() {
        install_hook();
        let _ = panic::catch_unwind(|| -> u8 { panic!("earlier, elsewhere") });
        assert!(LAST_BACKTRACE.with(|slot| slot.borrow().is_some()));

        fresh_backtrace(Box::pin(async {
            assert!(LAST_BACKTRACE.with(|slot| slot.borrow().is_none()));
        }))
        .await;
    }
}
