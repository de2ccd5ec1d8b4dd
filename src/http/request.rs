//! Transport-level request construction.
//!
//! # Responsibilities
//! - Serialize the target URL with its query parameters
//! - Uppercase the method and drop any body on GET
//! - Carry transport policy flags verbatim
//! - Tag every request with a unique ID for tracing
//!
//! # Design Decisions
//! - Building never touches the network; URL parsing is the only failure
//! - The ID stays local to logs; headers go out exactly as normalized
//! - Relative targets resolve against the environment's base URL, if any

use std::fmt;

use url::Url;
use uuid::Uuid;

use crate::config::schema::{
    CacheMode, CredentialsMode, RedirectPolicy, Referrer, RequestConfig, RequestMode,
};
use crate::http::body::RequestBody;
use crate::http::headers::Headers;
use crate::http::url::{build_url, is_absolute, UrlError};

/// Unique identifier for one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request value handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub id: RequestId,
    pub url: Url,
    pub method: String,
    pub headers: Headers,
    pub body: Option<RequestBody>,
    pub mode: Option<RequestMode>,
    pub cache: Option<CacheMode>,
    pub credentials: Option<CredentialsMode>,
    pub redirect: Option<RedirectPolicy>,
    pub referrer: Option<Referrer>,
}

impl TransportRequest {
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// Map a normalized config onto a [`TransportRequest`].
///
/// `headers` is the output of the header normalizer; `config.headers` is not
/// consulted again.
pub fn build_request(config: &RequestConfig, headers: Headers) -> Result<TransportRequest, UrlError> {
    build_request_in(config, headers, None)
}

/// Like [`build_request`], resolving a relative target against `base`.
pub fn build_request_in(
    config: &RequestConfig,
    headers: Headers,
    base: Option<&Url>,
) -> Result<TransportRequest, UrlError> {
    let target = resolve(config.full_url(), base);
    let url = build_url(&target, &config.params, config.params_serializer.as_deref())?;
    let method = config.method.to_uppercase();

    let body = if method == "GET" {
        if config.data.is_some() {
            tracing::debug!(url = %url, "Dropping body from GET request");
        }
        None
    } else {
        config.data.clone()
    };

    Ok(TransportRequest {
        id: RequestId::new(),
        url,
        method,
        headers,
        body,
        mode: config.mode,
        cache: config.cache,
        credentials: config.credentials,
        redirect: config.redirect,
        referrer: config.referrer.clone(),
    })
}

fn resolve(target: String, base: Option<&Url>) -> String {
    match base {
        Some(base) if !is_absolute(&target) || target.starts_with("//") => match base.join(&target) {
            Ok(url) => url.to_string(),
            Err(_) => target,
        },
        _ => target,
    }
}
