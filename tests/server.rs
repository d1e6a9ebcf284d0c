//! End-to-end behaviour over a real TCP connection.

use std::io;
use std::net::SocketAddr;

use http::StatusCode;
use mend::{ApiError, LoggerSource, Pipeline, Request, Response, serve_listener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::Span;

async fn app(req: Request) -> Result<Option<Response>, ApiError> {
    match req.path() {
        "/ok" => Ok(Some(Response::text("ok"))),
        "/missing" => Err(ApiError::new(4, "UserNotFound", StatusCode::NOT_FOUND, "")),
        "/silent" => Ok(None),
        "/boom" => panic!("boom"),
        "/pipe" => std::panic::panic_any(io::Error::other("write: broken pipe")),
        _ => Ok(Some(Response::status(StatusCode::NOT_FOUND))),
    }
}

/// Starts the guarded app on an ephemeral port.
async fn start() -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let pipeline = Pipeline::with_guards(app, LoggerSource::Fallback, Span::none());
    tokio::spawn(async move {
        serve_listener(listener, pipeline, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });
    (addr, tx)
}

/// Sends a bodiless GET and returns whatever came back before the server
/// closed the connection.
async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

fn body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map_or("", |(_, b)| b)
}

#[tokio::test]
async fn successful_response_is_served() {
    let (addr, _stop) = start().await;
    let raw = get(addr, "/ok").await;
    assert!(raw.starts_with("HTTP/1.1 200"));
    assert_eq!(body(&raw), "ok");
}

#[tokio::test]
async fn structured_error_is_served_with_its_status() {
    let (addr, _stop) = start().await;
    let raw = get(addr, "/missing").await;
    assert!(raw.starts_with("HTTP/1.1 404"));
    let json: serde_json::Value = serde_json::from_str(body(&raw)).unwrap();
    assert_eq!(json["code"], 4);
    assert_eq!(json["statusCode"], 404);
}

#[tokio::test]
async fn silent_handler_is_served_unset_response() {
    let (addr, _stop) = start().await;
    let raw = get(addr, "/silent").await;
    assert!(raw.starts_with("HTTP/1.1 500"));
    let json: serde_json::Value = serde_json::from_str(body(&raw)).unwrap();
    assert_eq!(json["code"], 11001);
}

#[tokio::test]
async fn panic_is_served_as_unexpected_error() {
    let (addr, _stop) = start().await;
    let raw = get(addr, "/boom").await;
    assert!(raw.starts_with("HTTP/1.1 500"));
    let json: serde_json::Value = serde_json::from_str(body(&raw)).unwrap();
    assert_eq!(json["message"], "UnexpectedError");
    assert_eq!(json["detail"], "boom");
}

#[tokio::test]
async fn broken_pipe_closes_connection_without_response() {
    let (addr, _stop) = start().await;
    let raw = get(addr, "/pipe").await;
    assert!(raw.is_empty(), "expected no bytes, got {raw:?}");
}

#[tokio::test]
async fn server_keeps_serving_after_a_panic() {
    let (addr, _stop) = start().await;
    assert!(get(addr, "/boom").await.starts_with("HTTP/1.1 500"));
    assert!(get(addr, "/ok").await.starts_with("HTTP/1.1 200"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_panics_do_not_leak_into_other_requests() {
    let (addr, _stop) = start().await;

    let paths = ["/ok", "/boom", "/pipe", "/missing", "/silent"];
    let mut requests = tokio::task::JoinSet::new();
    for i in 0..100 {
        let path = paths[i % paths.len()];
        requests.spawn(async move { (path, get(addr, path).await) });
    }

    while let Some(joined) = requests.join_next().await {
        let (path, raw) = joined.unwrap();
        match path {
            "/ok" => {
                assert!(raw.starts_with("HTTP/1.1 200"), "{path}: {raw}");
                assert_eq!(body(&raw), "ok");
            }
            "/boom" => {
                assert!(raw.starts_with("HTTP/1.1 500"), "{path}: {raw}");
                let json: serde_json::Value = serde_json::from_str(body(&raw)).unwrap();
                assert_eq!(json["detail"], "boom");
            }
            "/pipe" => assert!(raw.is_empty(), "{path}: {raw}"),
            "/missing" => assert!(raw.starts_with("HTTP/1.1 404"), "{path}: {raw}"),
            _ => {
                let json: serde_json::Value = serde_json::from_str(body(&raw)).unwrap();
                assert_eq!(json["code"], 11001);
            }
        }
    }
}
