//! Failure classification.
//!
//! One constructor per terminal failure path; each fixes the kind, code and
//! message the caller sees.

use std::sync::Arc;

use serde_json::json;

use crate::config::RequestConfig;
use crate::error::{ErrorCode, ErrorKind, StructuredError, TransportError};
use crate::http::headers::Headers;
use crate::http::request::TransportRequest;
use crate::http::response::{reason_phrase, ErrorResponse, ResponseOrigin};
use crate::http::url::UrlError;

/// Status reported for a locally aborted, timed-out exchange.
pub const TIMEOUT_STATUS: u16 = 504;

/// The timeout watcher won.
pub fn timeout(config: Arc<RequestConfig>, request: Arc<TransportRequest>) -> StructuredError {
    let message = format!("timeout of {}ms exceeded", config.timeout);
    let response = ErrorResponse {
        status: TIMEOUT_STATUS,
        status_text: reason_phrase(TIMEOUT_STATUS).to_string(),
        headers: Headers::new(),
        data: json!({ "code": TIMEOUT_STATUS, "message": message }),
        origin: ResponseOrigin::Local,
    };
    StructuredError {
        kind: ErrorKind::Timeout,
        message,
        code: Some(ErrorCode::ConnAborted),
        config,
        request: Some(request),
        response: Some(response),
        cause: None,
    }
}

/// The transport failed before a response was available.
pub fn network(
    config: Arc<RequestConfig>,
    request: Arc<TransportRequest>,
    cause: TransportError,
) -> StructuredError {
    StructuredError {
        kind: ErrorKind::Network,
        message: "Network Error".to_string(),
        code: None,
        config,
        request: Some(request),
        response: None,
        cause: Some(cause),
    }
}

/// The decoded payload carried an error flag.
pub fn application(
    config: Arc<RequestConfig>,
    request: Arc<TransportRequest>,
    response: ErrorResponse,
) -> StructuredError {
    StructuredError {
        kind: ErrorKind::Application,
        message: "JSON Error".to_string(),
        code: Some(ErrorCode::Status(response.status)),
        config,
        request: Some(request),
        response: Some(response),
        cause: None,
    }
}

/// The status failed the configured validator.
pub fn status(
    config: Arc<RequestConfig>,
    request: Arc<TransportRequest>,
    response: ErrorResponse,
) -> StructuredError {
    StructuredError {
        kind: ErrorKind::Status,
        message: format!("Request failed with status code {}", response.status),
        code: Some(ErrorCode::Status(response.status)),
        config,
        request: Some(request),
        response: Some(response),
        cause: None,
    }
}

/// The target URL could not be built; no request exists.
pub fn invalid_url(config: Arc<RequestConfig>, error: UrlError) -> StructuredError {
    StructuredError {
        kind: ErrorKind::InvalidUrl,
        message: format!("Invalid URL: {}", error),
        code: None,
        config,
        request: None,
        response: None,
        cause: None,
    }
}
