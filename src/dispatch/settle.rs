//! Response settlement.
//!
//! # Responsibilities
//! - Decode the response body as JSON
//! - Reject when the decoded payload carries a truthy `hasError` flag
//! - Substitute `{code, message}` for bodies that are not JSON
//! - Apply the optional status validator
//!
//! # Design Decisions
//! - A malformed body never causes a rejection on its own
//! - The error flag is honoured regardless of HTTP status

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::RequestConfig;
use crate::dispatch::classify;
use crate::dispatch::state::Outcome;
use crate::http::request::TransportRequest;
use crate::http::response::{ErrorResponse, RawResponse, ResponseOrigin, StandardizedResponse};

/// Field whose truthiness marks an application-level failure.
pub const ERROR_FLAG: &str = "hasError";

/// Decoded response, ready to settle once the dispatch is won.
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: crate::http::headers::Headers,
    pub data: Value,
    /// False when `data` was synthesized from the status line.
    pub decoded: bool,
}

/// Decode `raw` without deciding the outcome.
pub fn decode(raw: RawResponse) -> DecodedResponse {
    match serde_json::from_slice::<Value>(&raw.body) {
        Ok(data) => DecodedResponse {
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            data,
            decoded: true,
        },
        Err(e) => {
            tracing::debug!(status = raw.status, error = %e, "Response body is not JSON");
            DecodedResponse {
                data: json!({ "code": raw.status, "message": raw.status_text }),
                status: raw.status,
                status_text: raw.status_text,
                headers: raw.headers,
                decoded: false,
            }
        }
    }
}

/// Turn a decoded response into the dispatch outcome.
pub fn settle(
    response: DecodedResponse,
    config: Arc<RequestConfig>,
    request: Arc<TransportRequest>,
) -> Outcome {
    if response.decoded && has_error_flag(&response.data) {
        let error = ErrorResponse {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            data: response.data,
            origin: ResponseOrigin::Server,
        };
        return Err(classify::application(config, request, error).into());
    }

    if let Some(validator) = &config.validate_status {
        if !validator.accepts(response.status) {
            let error = ErrorResponse {
                status: response.status,
                status_text: response.status_text,
                headers: response.headers,
                data: response.data,
                origin: ResponseOrigin::Server,
            };
            return Err(classify::status(config.clone(), request, error).into());
        }
    }

    Ok(StandardizedResponse {
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        data: response.data,
        config,
        request,
    })
}

/// Truthiness of `data[ERROR_FLAG]`; non-objects have no flag.
pub fn has_error_flag(data: &Value) -> bool {
    data.get(ERROR_FLAG).is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
