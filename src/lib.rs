//! # mend
//!
//! Panic recovery and error resolution for hyper-based HTTP services.
//! Every request gets exactly one well-formed response, whatever the handler
//! did.
//!
//! ## The contract
//!
//! | The handler… | The client gets… |
//! |---|---|
//! | responded | that response, untouched |
//! | attached an [`ApiError`] | its status and JSON body (first one wins) |
//! | attached only other errors | `500` `UnexpectedError` wrapping the last one |
//! | did nothing | `500` `UnsetResponse`, code 11001 |
//! | panicked with an [`ApiError`] | its status and JSON body |
//! | panicked on a dead connection | nothing; the connection is closed |
//! | panicked with anything else | `500` `UnexpectedError`, logged with a stack trace |
//!
//! Logged request headers always have `Authorization` masked.
//!
//! What mend leaves to you:
//!
//! - **Routing** — hand [`Pipeline`] any handler; dispatch inside it.
//! - **Logger setup** — mend emits `tracing` events; install a subscriber.
//! - **Success bodies** — mend only shapes error responses.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use mend::{ApiError, LoggerSource, Pipeline, Request, Response, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Pipeline::with_guards(
//!         get_user,
//!         LoggerSource::factory(|cx: &mend::Context| {
//!             tracing::info_span!("request", path = %cx.head().uri().path())
//!         }),
//!         tracing::info_span!("mend"),
//!     );
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, ApiError> {
//!     match req.header("x-user") {
//!         Some(name) => Ok(Response::text(name.to_owned())),
//!         None => Err(ApiError::new(4, "UserNotFound", StatusCode::NOT_FOUND, "")),
//!     }
//! }
//! ```

mod api_error;
mod context;
mod error;
mod handler;
mod logger;
mod panic;
mod pipeline;
mod request;
mod response;
mod server;

pub mod middleware;
pub mod redact;

pub use api_error::{ApiError, UNEXPECTED_ERROR_CODE, UNSET_RESPONSE_CODE};
pub use context::Context;
pub use error::{BoxError, Error};
pub use handler::{BoxFuture, Handler, Outcome, Reply};
pub use logger::{DEFAULT_PROVIDER_KEY, LoggerFactory, LoggerProvider, LoggerSource};
pub use panic::panic_message;
pub use pipeline::Pipeline;
pub use request::{Request, RequestHead};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use server::{Server, serve_listener};
