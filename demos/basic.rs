//! Minimal mend example — one endpoint showing every error path.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/0          # 404 ApiError
//!   curl -i http://localhost:3000/silent           # 500 UnsetResponse
//!   curl -i -H 'authorization: Bearer xyz' http://localhost:3000/panic
//!                                                  # 500, token masked in the log

use http::StatusCode;
use mend::{ApiError, Context, LoggerSource, Pipeline, Request, Response, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Pipeline::with_guards(
        handle,
        LoggerSource::factory(|cx: &Context| {
            tracing::info_span!(
                "request",
                method = %cx.head().method(),
                path = %cx.head().uri().path()
            )
        }),
        tracing::info_span!("basic"),
    );

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// Routing is the application's business; a match on the path is enough here.
async fn handle(req: Request) -> Result<Option<Response>, ApiError> {
    let path = req.path();
    if path == "/silent" {
        return Ok(None);
    }
    if path == "/panic" {
        panic!("handler exploded");
    }
    match path.strip_prefix("/users/") {
        Some("0") => Err(ApiError::new(4, "UserNotFound", StatusCode::NOT_FOUND, "no user 0")),
        Some(id) => Ok(Some(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#)))),
        None => Ok(Some(Response::status(StatusCode::NOT_FOUND))),
    }
}
