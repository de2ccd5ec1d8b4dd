//! Configuration schema definitions.
//!
//! [`RequestConfig`] describes one exchange; [`AdapterSettings`] configures
//! the transport shared by many exchanges. Data fields derive Serde traits
//! for loading from config files; callbacks and tokens are attached in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::body::RequestBody;
use crate::http::headers::Headers;
use crate::http::url::{Params, ParamsSerializer};
use crate::lifecycle::CancelToken;
use crate::net::progress::ProgressCallback;
use crate::security::auth::BasicAuth;

/// Declarative description of a single HTTP exchange.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Target URL, absolute or relative to `base_url`.
    pub url: String,

    /// Prefix for relative `url` values.
    pub base_url: Option<String>,

    /// HTTP method, any case (default: `get`).
    pub method: String,

    /// Request payload. Never sent with GET.
    pub data: Option<RequestBody>,

    /// Caller headers, case-insensitive.
    pub headers: Headers,

    /// Basic-auth credentials.
    pub auth: Option<BasicAuth>,

    /// Send credentials (and the anti-forgery token) cross-site.
    pub with_credentials: bool,

    /// Cookie holding the anti-forgery token.
    pub xsrf_cookie_name: Option<String>,

    /// Header echoing the anti-forgery token.
    pub xsrf_header_name: Option<String>,

    pub mode: Option<RequestMode>,
    pub cache: Option<CacheMode>,
    pub credentials: Option<CredentialsMode>,
    pub redirect: Option<RedirectPolicy>,
    pub referrer: Option<Referrer>,

    /// Timeout in milliseconds (0 = none).
    pub timeout: u64,

    /// Query parameters appended to the URL.
    pub params: Params,

    #[serde(skip)]
    pub params_serializer: Option<Arc<dyn ParamsSerializer>>,

    #[serde(skip)]
    pub on_download_progress: Option<ProgressCallback>,

    #[serde(skip)]
    pub on_upload_progress: Option<ProgressCallback>,

    #[serde(skip)]
    pub cancel_token: Option<CancelToken>,

    /// Statuses failing this predicate reject. Absent: every status resolves.
    #[serde(skip)]
    pub validate_status: Option<StatusValidator>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            base_url: None,
            method: "get".to_string(),
            data: None,
            headers: Headers::new(),
            auth: None,
            with_credentials: false,
            xsrf_cookie_name: None,
            xsrf_header_name: None,
            mode: None,
            cache: None,
            credentials: None,
            redirect: None,
            referrer: None,
            timeout: 0,
            params: Params::new(),
            params_serializer: None,
            on_download_progress: None,
            on_upload_progress: None,
            cancel_token: None,
            validate_status: None,
        }
    }
}

impl RequestConfig {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("get", url)
    }

    pub fn post(url: impl Into<String>, data: impl Into<RequestBody>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::new("post", url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn on_download_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_download_progress = Some(callback);
        self
    }

    pub fn on_upload_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_upload_progress = Some(callback);
        self
    }

    /// Anti-forgery cookie and header names.
    pub fn xsrf(mut self, cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(cookie_name.into());
        self.xsrf_header_name = Some(header_name.into());
        self
    }

    /// URL the request targets before query serialization.
    pub fn full_url(&self) -> String {
        match &self.base_url {
            Some(base) if !crate::http::url::is_absolute(&self.url) => {
                crate::http::url::combine(base, &self.url)
            }
            _ => self.url.clone(),
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("method", &self.method)
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .field("with_credentials", &self.with_credentials)
            .field("xsrf_cookie_name", &self.xsrf_cookie_name)
            .field("xsrf_header_name", &self.xsrf_header_name)
            .field("mode", &self.mode)
            .field("cache", &self.cache)
            .field("credentials", &self.credentials)
            .field("redirect", &self.redirect)
            .field("referrer", &self.referrer)
            .field("timeout", &self.timeout)
            .field("params", &self.params)
            .field("params_serializer", &self.params_serializer)
            .field("on_download_progress", &self.on_download_progress.is_some())
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .field("cancel_token", &self.cancel_token.is_some())
            .field("validate_status", &self.validate_status.is_some())
            .finish()
    }
}

/// Predicate deciding which statuses resolve.
#[derive(Clone)]
pub struct StatusValidator(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl StatusValidator {
    pub fn new(f: impl Fn(u16) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Accept 2xx only.
    pub fn success() -> Self {
        Self::new(|status| (200..300).contains(&status))
    }

    pub fn accepts(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StatusValidator")
    }
}

/// Request mode (CORS behaviour in browser transports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

/// HTTP cache interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

/// Whether cookies and auth travel with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
    Omit,
    SameOrigin,
    Include,
}

/// Redirect handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    #[default]
    Follow,
    Error,
    Manual,
}

/// Referrer sent with the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Referrer {
    Client,
    NoReferrer,
    Url(String),
}

/// Transport configuration (the `[adapter]` section of a request file).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Connection establishment timeout in milliseconds (0 = none).
    pub connect_timeout_ms: u64,

    /// `user-agent` sent when the request has none.
    pub user_agent: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            user_agent: concat!("fetch-adapter/", env!("CARGO_PKG_VERSION")).to_string(),
            log_level: "info".to_string(),
        }
    }
}
