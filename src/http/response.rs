//! Response shapes.
//!
//! # Responsibilities
//! - `RawResponse`: what the transport hands back (status line, headers, bytes)
//! - `StandardizedResponse`: what a successful dispatch resolves with
//! - `ErrorResponse`: response context attached to a structured error
//!
//! # Design Decisions
//! - Payloads are `serde_json::Value` so callers get decoded data directly
//! - A locally synthesized response (timeout) is marked as such and never
//!   confused with a server reply

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::http::headers::Headers;
use crate::http::request::TransportRequest;

/// Completed exchange as reported by the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: Headers::new(),
            body: body.into(),
        }
    }
}

/// Successful dispatch result.
#[derive(Debug, Clone)]
pub struct StandardizedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub data: Value,
    pub config: Arc<RequestConfig>,
    pub request: Arc<TransportRequest>,
}

/// Where an [`ErrorResponse`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrigin {
    /// Sent by the server.
    Server,
    /// Synthesized by the adapter; no server reply exists.
    Local,
}

/// Response context carried by a structured error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub data: Value,
    pub origin: ResponseOrigin,
}

/// Canonical reason phrase for `status`, empty when unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}
