//! HTTP server and graceful shutdown.
//!
//! The server is the host the middleware runs in: it turns each hyper
//! request into a [`Context`], runs the [`Pipeline`], and turns the context
//! back into what goes on the wire.
//!
//! | Context after the pipeline | Sent to the client |
//! |---|---|
//! | response written | that response |
//! | aborted | nothing; the connection is closed |
//! | neither | empty `200 OK` |
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting connections, lets
//! every in-flight connection task finish, and then returns from
//! [`Server::serve`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::context::Context;
use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::request::RequestHead;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `pipeline`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        self.serve_with_shutdown(pipeline, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops on `signal` instead of
    /// SIGTERM / Ctrl-C.
    pub async fn serve_with_shutdown(
        self,
        pipeline: Pipeline,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, pipeline, signal).await
    }
}

/// Serves `pipeline` on an already bound listener until `signal` resolves,
/// then drains in-flight connections.
pub async fn serve_listener(
    listener: TcpListener,
    pipeline: Pipeline,
    signal: impl Future<Output = ()> + Send,
) -> Result<(), Error> {
    let addr = listener.local_addr()?;
    let pipeline = Arc::new(pipeline);

    info!(addr = %addr, "mend listening");

    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting immediately.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let pipeline = Arc::clone(&pipeline);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let pipeline = Arc::clone(&pipeline);
                        async move { dispatch(&pipeline, req).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        debug!(peer = %remote_addr, "connection closed: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("mend stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the pipeline.
///
/// Returning `Err` makes hyper close the connection without a response,
/// which is exactly what an aborted context asks for.
pub(crate) async fn dispatch(
    pipeline: &Pipeline,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Error> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let head = RequestHead::new(parts.method, parts.uri, parts.version, parts.headers);
    let mut cx = Context::new(head, body);
    pipeline.call(&mut cx).await;

    if cx.is_aborted() {
        return Err(Error::Aborted);
    }
    let response = cx.take_response().unwrap_or_else(|| Response::status(StatusCode::OK));
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
