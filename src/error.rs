//! Error types surfaced by a dispatch.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::RequestConfig;
use crate::http::request::TransportRequest;
use crate::http::response::ErrorResponse;
use crate::lifecycle::Cancel;

/// Failures reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange was dropped after an abort signal.
    #[error("exchange aborted")]
    Aborted,

    /// The request could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// DNS, TLS, connect or body I/O failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure category of a [`StructuredError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local abort after the deadline; no server response.
    Timeout,
    /// The transport rejected the exchange.
    Network,
    /// The decoded payload carried an error flag.
    Application,
    /// The status failed the configured validator.
    Status,
    /// The target URL could not be built.
    InvalidUrl,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network_error",
            ErrorKind::Application => "application_error",
            ErrorKind::Status => "status_error",
            ErrorKind::InvalidUrl => "invalid_url",
        }
    }
}

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// `ECONNABORTED`: the timeout fired.
    ConnAborted,
    /// HTTP status of the response that caused the error.
    Status(u16),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::ConnAborted => write!(f, "ECONNABORTED"),
            ErrorCode::Status(status) => write!(f, "{}", status),
        }
    }
}

/// Error value produced on every non-cancellation failure path.
///
/// Carries enough context (config, request, response, cause) for the caller
/// to log or retry.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StructuredError {
    pub kind: ErrorKind,
    pub message: String,
    pub code: Option<ErrorCode>,
    pub config: Arc<RequestConfig>,
    pub request: Option<Arc<TransportRequest>>,
    pub response: Option<ErrorResponse>,
    #[source]
    pub cause: Option<TransportError>,
}

impl StructuredError {
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// Why a dispatch did not resolve.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Failed(Box<StructuredError>),

    /// The caller's cancellation reason, unmodified.
    #[error("{0}")]
    Cancelled(Arc<Cancel>),
}

impl Rejection {
    pub fn as_error(&self) -> Option<&StructuredError> {
        match self {
            Rejection::Failed(error) => Some(error),
            Rejection::Cancelled(_) => None,
        }
    }

    pub fn as_cancel(&self) -> Option<&Arc<Cancel>> {
        match self {
            Rejection::Cancelled(reason) => Some(reason),
            Rejection::Failed(_) => None,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Rejection::Cancelled(_))
    }
}

impl From<StructuredError> for Rejection {
    fn from(error: StructuredError) -> Self {
        Rejection::Failed(Box::new(error))
    }
}
