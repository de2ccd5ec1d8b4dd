//! Configuration loading from disk.
//!
//! A request file has two optional sections:
//!
//! ```toml
//! [adapter]
//! connect_timeout_ms = 5000
//! log_level = "debug"
//!
//! [request]
//! url = "https://api.example.com/items"
//! method = "post"
//! timeout = 2000
//! headers = { Accept = "application/json" }
//! data = { type = "json", value = { name = "widget" } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::{AdapterSettings, RequestConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Contents of a request file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestFile {
    pub adapter: AdapterSettings,
    pub request: RequestConfig,
}

/// Parse a request file from TOML text without validating it.
///
/// For callers that complete the request (e.g. from flags) before
/// validating.
pub fn parse_request_file(content: &str) -> Result<RequestFile, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Parse and validate a request file from TOML text.
pub fn parse_config(content: &str) -> Result<RequestFile, ConfigError> {
    let file = parse_request_file(content)?;
    validate_config(&file.request).map_err(ConfigError::Validation)?;
    Ok(file)
}

/// Read a request file without validating it.
pub fn read_config(path: &Path) -> Result<RequestFile, ConfigError> {
    let content = fs::read_to_string(path)?;
    let file = parse_request_file(&content)?;

    tracing::debug!(
        path = %path.display(),
        url = %file.request.url,
        method = %file.request.method,
        "Configuration loaded"
    );
    Ok(file)
}

/// Load and validate a request file.
pub fn load_config(path: &Path) -> Result<RequestFile, ConfigError> {
    let file = read_config(path)?;
    validate_config(&file.request).map_err(ConfigError::Validation)?;
    Ok(file)
}
