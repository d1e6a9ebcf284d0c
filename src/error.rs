//! Unified error type.

/// Any error a handler can attach to a request.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by mend's fallible operations.
///
/// Application-level failures are expressed as [`ApiError`](crate::ApiError)
/// values attached to the request. This type surfaces infrastructure
/// failures: binding to a port, accepting a connection, or a request whose
/// connection was deliberately aborted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The pipeline aborted the request; the connection is closed without a
    /// response.
    #[error("connection aborted")]
    Aborted,
}
