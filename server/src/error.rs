//! Error types for the todos server.
//!
//! User mistakes (bad names, unknown ids) never surface as errors; the
//! action layer turns them into flash messages. [`ServerError`] covers the
//! remaining infrastructure failures, such as a session that cannot be
//! saved, and maps them onto HTTP responses.
//!
//! # Example
//!
//! ```rust
//! use todos_server::error::ServerError;
//!
//! let err = ServerError::internal("template missing");
//! assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
//! ```

use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::session::SessionError;

/// Top-level error type for the todos server.
#[derive(Debug)]
pub enum ServerError {
    /// The session could not be persisted.
    Session(SessionError),

    /// Unexpected internal server error.
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::Internal(msg) => write!(f, "internal server error: {msg}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Internal(_) => None,
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl ServerError {
    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error.
    ///
    /// A full memory store is reported as temporary unavailability.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::AtCapacity { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(error = %self, status = status.as_u16(), "Request failed");

        let body = match status {
            StatusCode::SERVICE_UNAVAILABLE => "The server is busy. Please try again later.",
            _ => "Something went wrong.",
        };
        (status, body).into_response()
    }
}

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
