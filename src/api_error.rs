//! Structured application errors.
//!
//! An [`ApiError`] is a known, classified failure: it carries the HTTP status
//! it maps to and a machine-readable code. Handlers return it (or attach it to
//! the request) and the error middleware writes it verbatim as the response
//! body:
//!
//! ```json
//! {"code":4,"message":"UserNotFound","statusCode":404,"detail":"no user 42"}
//! ```

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::response::{IntoResponse, Response};

/// Code used for failures that were not classified by application code.
pub const UNEXPECTED_ERROR_CODE: i32 = 10000;

/// Code used when the handler chain finished without writing a response.
pub const UNSET_RESPONSE_CODE: i32 = 11001;

/// A known, classified failure with a defined HTTP status.
///
/// Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message} ({code}): {detail}")]
pub struct ApiError {
    code: i32,
    message: String,
    status_code: u16,
    detail: String,
}

impl ApiError {
    pub fn new(
        code: i32,
        message: impl Into<String>,
        status: StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// `500` wrapping any displayable failure as `UnexpectedError`.
    pub fn unexpected(cause: impl fmt::Display) -> Self {
        Self::new(
            UNEXPECTED_ERROR_CODE,
            "UnexpectedError",
            StatusCode::INTERNAL_SERVER_ERROR,
            cause.to_string(),
        )
    }

    /// `500` for a handler chain that returned without responding.
    pub fn unset_response() -> Self {
        Self::new(
            UNSET_RESPONSE_CODE,
            "UnsetResponse",
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
        )
    }

    pub fn code(&self) -> i32 { self.code }
    pub fn message(&self) -> &str { &self.message }
    pub fn detail(&self) -> &str { &self.detail }

    /// The HTTP status this error maps to. Codes outside `100..=999` fall
    /// back to `500`.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match serde_json::to_vec(&self) {
            Ok(body) => Response::builder().status(status).json(body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialise api error");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
