//! Execution environment seen by the header normalizer.
//!
//! # Responsibilities
//! - Report whether browser-style storage (cookies) is reachable
//! - Decide whether a request URL is same-origin with the document
//! - Read named cookies for the cross-site-request-forgery token
//!
//! # Design Decisions
//! - `Headless` is the default: no storage, so no token is ever read
//! - `DocumentEnvironment` models a page: an origin plus a
//!   `document.cookie`-style string that can be replaced at runtime
//! - Relative URLs resolve against the document origin

use std::sync::RwLock;

use percent_encoding::percent_decode_str;
use url::Url;

/// Collaborator consulted while computing the anti-forgery header.
pub trait Environment: Send + Sync {
    /// Standard browser-like storage access is available.
    fn has_standard_storage(&self) -> bool;

    /// `url` targets the same origin as the current document.
    fn is_same_origin(&self, url: &str) -> bool;

    /// Value of the cookie called `name`, percent-decoded.
    fn read_cookie(&self, name: &str) -> Option<String>;

    /// Base that relative request URLs resolve against.
    fn base_url(&self) -> Option<&Url> {
        None
    }
}

/// Environment without storage access (servers, workers, CLIs).
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Environment for Headless {
    fn has_standard_storage(&self) -> bool {
        false
    }

    fn is_same_origin(&self, _url: &str) -> bool {
        false
    }

    fn read_cookie(&self, _name: &str) -> Option<String> {
        None
    }
}

/// A document with an origin and a cookie string.
#[derive(Debug)]
pub struct DocumentEnvironment {
    origin: Url,
    cookies: RwLock<String>,
}

impl DocumentEnvironment {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            cookies: RwLock::new(String::new()),
        }
    }

    /// Replace the cookie string (`name=value; other=value`).
    pub fn with_cookies(self, cookies: impl Into<String>) -> Self {
        self.set_cookies(cookies);
        self
    }

    pub fn set_cookies(&self, cookies: impl Into<String>) {
        let mut guard = self.cookies.write().unwrap_or_else(|e| e.into_inner());
        *guard = cookies.into();
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

impl Environment for DocumentEnvironment {
    fn has_standard_storage(&self) -> bool {
        true
    }

    fn is_same_origin(&self, url: &str) -> bool {
        match self.origin.join(url) {
            Ok(target) => target.origin() == self.origin.origin(),
            Err(_) => false,
        }
    }

    fn base_url(&self) -> Option<&Url> {
        Some(&self.origin)
    }

    fn read_cookie(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        cookies
            .split(';')
            .filter_map(|pair| pair.trim_start().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
    }
}
