//! Header normalization before transport.
//!
//! # Responsibilities
//! - Drop `content-type` for multipart bodies (the transport writes the boundary)
//! - Add `authorization` for basic-auth credentials
//! - Echo the anti-forgery cookie as a header when the environment allows it
//! - Drop `content-type` when there is no body at all
//!
//! # Design Decisions
//! - Works on a copy; the caller's config is never mutated
//! - Never fails: absent optional fields are no-ops

use crate::config::RequestConfig;
use crate::http::headers::{Headers, AUTHORIZATION, CONTENT_TYPE};
use crate::security::environment::Environment;

/// Compute the header set sent with `config`.
pub fn normalize_headers(config: &RequestConfig, env: &dyn Environment) -> Headers {
    let mut headers = config.headers.clone();

    if config.data.as_ref().is_some_and(|data| data.is_multipart()) {
        headers.remove(CONTENT_TYPE);
    }

    if let Some(auth) = &config.auth {
        headers.set(AUTHORIZATION, auth.header_value());
    }

    if env.has_standard_storage() {
        if let (Some(token), Some(header)) = (xsrf_token(config, env), &config.xsrf_header_name) {
            headers.set(header.clone(), token);
        }
    }

    if config.data.is_none() {
        headers.remove(CONTENT_TYPE);
    }

    headers
}

/// Anti-forgery token for `config`, if one should be sent.
///
/// Read only for same-origin requests or when credentials are requested, and
/// only when a cookie name is configured. Empty cookies count as absent.
pub fn xsrf_token(config: &RequestConfig, env: &dyn Environment) -> Option<String> {
    let cookie_name = config.xsrf_cookie_name.as_deref()?;
    if !(config.with_credentials || env.is_same_origin(&config.full_url())) {
        return None;
    }
    env.read_cookie(cookie_name).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::{FormData, RequestBody};
    use crate::security::auth::BasicAuth;
    use crate::security::environment::{DocumentEnvironment, Headless};
    use url::Url;

    fn document() -> DocumentEnvironment {
        DocumentEnvironment::new(Url::parse("https://app.test").unwrap())
            .with_cookies("XSRF-TOKEN=tok")
    }

    #[test]
    fn multipart_drops_content_type() {
        let config = RequestConfig::post("https://app.test/upload", FormData::new().text("a", "b"))
            .header("Content-Type", "multipart/form-data")
            .header("Accept", "*/*");
        let headers = normalize_headers(&config, &Headless);
        assert!(!headers.contains(CONTENT_TYPE));
        assert_eq!(headers.get("accept"), Some("*/*"));
    }

    #[test]
    fn missing_body_drops_content_type() {
        let config = RequestConfig::get("https://app.test/").header("content-type", "application/json");
        assert!(!normalize_headers(&config, &Headless).contains(CONTENT_TYPE));

        let config = RequestConfig::post("https://app.test/", RequestBody::from("{}"))
            .header("content-type", "application/json");
        assert_eq!(
            normalize_headers(&config, &Headless).get(CONTENT_TYPE),
            Some("application/json")
        );
    }

    #[test]
    fn basic_auth_overrides_existing_authorization() {
        let config = RequestConfig::get("https://app.test/")
            .header("authorization", "Bearer x")
            .auth(BasicAuth::new("a", "b"));
        let headers = normalize_headers(&config, &Headless);
        assert_eq!(headers.get("Authorization"), Some("Basic YTpi"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn xsrf_header_set_for_same_origin() {
        let config = RequestConfig::get("/api").xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
        let headers = normalize_headers(&config, &document());
        assert_eq!(headers.get("x-xsrf-token"), Some("tok"));
    }

    #[test]
    fn xsrf_skipped_cross_site_without_credentials() {
        let config = RequestConfig::get("https://other.test/api").xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
        assert!(!normalize_headers(&config, &document()).contains("x-xsrf-token"));

        let mut config = config;
        config.with_credentials = true;
        assert_eq!(
            normalize_headers(&config, &document()).get("x-xsrf-token"),
            Some("tok")
        );
    }

    #[test]
    fn xsrf_needs_storage_and_names() {
        let config = RequestConfig::get("https://app.test/api").xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
        assert!(!normalize_headers(&config, &Headless).contains("x-xsrf-token"));

        let mut no_header = config.clone();
        no_header.xsrf_header_name = None;
        assert_eq!(normalize_headers(&no_header, &document()).len(), 0);

        let mut no_cookie = config;
        no_cookie.xsrf_cookie_name = None;
        assert!(xsrf_token(&no_cookie, &document()).is_none());
    }
}
