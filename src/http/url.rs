//! Target URL construction.
//!
//! # Responsibilities
//! - Join a relative request URL onto the configured base URL
//! - Serialize query parameters (default encoder or a caller serializer)
//! - Append the query string and parse the result
//!
//! # Design Decisions
//! - A fragment is dropped before the query is appended
//! - Parameters with `null` values are skipped; arrays repeat as `key[]`
//! - Parsing is the only failure point (`UrlError`)

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Ordered query parameters.
pub type Params = serde_json::Map<String, Value>;

/// Characters escaped by a URI component encoder.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors raised while building the target URL.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("{url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Turns query parameters into a query string (without the leading `?`).
pub trait ParamsSerializer: Send + Sync + fmt::Debug {
    fn serialize(&self, params: &Params) -> String;
}

/// Form-style serializer with readable brackets, colons and commas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParamsSerializer;

impl ParamsSerializer for DefaultParamsSerializer {
    fn serialize(&self, params: &Params) -> String {
        let mut parts = Vec::new();
        for (key, value) in params {
            let (key, values): (String, Vec<&Value>) = match value {
                Value::Null => continue,
                Value::Array(items) => (format!("{key}[]"), items.iter().collect()),
                other => (key.clone(), vec![other]),
            };
            for value in values {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Object(_) | Value::Array(_) => value.to_string(),
                    other => other.to_string(),
                };
                parts.push(format!("{}={}", encode(&key), encode(&text)));
            }
        }
        parts.join("&")
    }
}

/// Encode a query component, keeping a few reserved characters readable.
pub fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT)
        .to_string()
        .replace("%40", "@")
        .replace("%3A", ":")
        .replace("%24", "$")
        .replace("%2C", ",")
        .replace("%20", "+")
        .replace("%5B", "[")
        .replace("%5D", "]")
}

/// Join `relative` onto `base`, collapsing the slashes between them.
pub fn combine(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// True when `url` starts with a scheme or is protocol-relative.
pub fn is_absolute(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    match url.find(':') {
        Some(idx) if idx > 0 => {
            let scheme = &url[..idx];
            scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && url[idx..].starts_with("://")
        }
        _ => false,
    }
}

/// Append serialized `params` to `url` and parse the result.
pub fn build_url(
    url: &str,
    params: &Params,
    serializer: Option<&dyn ParamsSerializer>,
) -> Result<Url, UrlError> {
    let serialized = if params.is_empty() {
        String::new()
    } else {
        match serializer {
            Some(custom) => custom.serialize(params),
            None => DefaultParamsSerializer.serialize(params),
        }
    };

    let mut target = url.to_string();
    if !serialized.is_empty() {
        if let Some(hash) = target.find('#') {
            target.truncate(hash);
        }
        target.push(if target.contains('?') { '&' } else { '?' });
        target.push_str(&serialized);
    }

    Url::parse(&target).map_err(|source| UrlError::Parse {
        url: target.clone(),
        source,
    })
}
