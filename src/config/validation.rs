//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject values the transport could never put on the wire
//! - Catch half-configured features (xsrf header without its cookie)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RequestConfig → Result<(), Vec<ValidationError>>
//! - URL parse failures are left to dispatch, which reports them as rejections

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::RequestConfig;

/// A single semantic problem in a request configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request url is empty")]
    EmptyUrl,

    #[error("method {0:?} is not a valid HTTP token")]
    InvalidMethod(String),

    #[error("header name {0:?} is invalid")]
    InvalidHeaderName(String),

    #[error("header {0:?} has an invalid value")]
    InvalidHeaderValue(String),

    #[error("xsrf header {0:?} is set without an xsrf cookie name")]
    XsrfHeaderWithoutCookie(String),

    #[error("auth {0} contains control characters")]
    InvalidCredentials(&'static str),
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &RequestConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let has_base = config.base_url.as_deref().is_some_and(|base| !base.trim().is_empty());
    if config.url.trim().is_empty() && !has_base {
        errors.push(ValidationError::EmptyUrl);
    }

    if !is_token(&config.method) {
        errors.push(ValidationError::InvalidMethod(config.method.clone()));
    }

    for (name, value) in config.headers.iter() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.to_string()));
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue(name.to_string()));
        }
    }

    if let Some(header) = &config.xsrf_header_name {
        if config.xsrf_cookie_name.is_none() {
            errors.push(ValidationError::XsrfHeaderWithoutCookie(header.clone()));
        }
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(header.clone()));
        }
    }

    if let Some(auth) = &config.auth {
        if auth.username.as_deref().is_some_and(has_control) {
            errors.push(ValidationError::InvalidCredentials("username"));
        }
        if auth.password.as_deref().is_some_and(has_control) {
            errors.push(ValidationError::InvalidCredentials("password"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 9110 `token`.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn has_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}
