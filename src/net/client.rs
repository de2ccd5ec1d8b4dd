//! Production transport built on `reqwest`.
//!
//! # Responsibilities
//! - Map a `TransportRequest` onto a reqwest request (method, headers, body)
//! - Apply redirect, cache, credentials and referrer policies
//! - Report upload progress as the body is handed to the connection
//! - Stream the response body, reporting download progress per chunk
//!
//! # Design Decisions
//! - Redirect policy is per-client in reqwest, so one client per policy
//! - Mode only matters to browser transports; it is logged and ignored
//! - Status codes are never errors here; classification is the settler's job

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt};
use hyper::ext::ReasonPhrase;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::schema::{AdapterSettings, CacheMode, CredentialsMode, RedirectPolicy, Referrer};
use crate::error::TransportError;
use crate::http::body::{FormData, FormPart, RequestBody};
use crate::http::headers::{Headers, CONTENT_TYPE};
use crate::http::request::TransportRequest;
use crate::http::response::{reason_phrase, RawResponse};
use crate::net::{Exchange, Progress, Transport};

/// Upload chunk size when upload progress is requested.
const UPLOAD_CHUNK: usize = 16 * 1024;

/// `Transport` over reqwest/hyper.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    follow: Client,
    manual: Client,
    error: Client,
}

impl ReqwestTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_settings(&AdapterSettings::default())
    }

    pub fn with_settings(settings: &AdapterSettings) -> Result<Self, TransportError> {
        let build = |policy: Policy| -> Result<Client, TransportError> {
            let mut builder = Client::builder()
                .redirect(policy)
                .user_agent(settings.user_agent.clone());
            if settings.connect_timeout_ms > 0 {
                builder = builder.connect_timeout(Duration::from_millis(settings.connect_timeout_ms));
            }
            Ok(builder.build()?)
        };

        Ok(Self {
            follow: build(Policy::default())?,
            manual: build(Policy::none())?,
            error: build(Policy::custom(|attempt| attempt.error("redirects are not allowed")))?,
        })
    }

    fn client_for(&self, policy: Option<RedirectPolicy>) -> &Client {
        match policy.unwrap_or_default() {
            RedirectPolicy::Follow => &self.follow,
            RedirectPolicy::Manual => &self.manual,
            RedirectPolicy::Error => &self.error,
        }
    }

    fn prepare(
        &self,
        request: &TransportRequest,
        exchange: &Exchange,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut headers = request.headers.clone();
        apply_policies(request, &mut headers);

        let mut builder = self
            .client_for(request.redirect)
            .request(method, request.url.clone());

        let payload = match &request.body {
            None => None,
            Some(RequestBody::Multipart(form)) => {
                builder = builder.multipart(to_multipart(form)?);
                None
            }
            Some(RequestBody::Text(text)) => Some(Bytes::from(text.clone())),
            Some(RequestBody::Bytes(bytes)) => Some(bytes.clone()),
            Some(RequestBody::Json(value)) => Some(Bytes::from(value.to_string())),
        };

        if let (Some(bytes), Some(body)) = (payload, &request.body) {
            if !headers.contains(CONTENT_TYPE) {
                if let Some(content_type) = default_content_type(body) {
                    headers.set(CONTENT_TYPE, content_type);
                }
            }
            if exchange.wants_upload_progress() {
                headers.set("content-length", bytes.len().to_string());
                builder = builder.body(reqwest::Body::wrap_stream(upload_stream(
                    bytes,
                    exchange.clone(),
                )));
            } else {
                builder = builder.body(bytes);
            }
        }

        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        Ok(builder)
    }

    async fn execute(
        &self,
        request: &TransportRequest,
        exchange: &Exchange,
    ) -> Result<RawResponse, TransportError> {
        let builder = self.prepare(request, exchange)?;
        let response = builder.send().await?;

        if let Some(RequestBody::Multipart(form)) = &request.body {
            let total = form.payload_len();
            exchange.report_upload(Progress {
                loaded: total,
                total: Some(total),
            });
        }

        let status = response.status();
        // hyper only records the phrase when it differs from the canonical one.
        let status_text = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
            .unwrap_or_else(|| reason_phrase(status.as_u16()).to_string());
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let total = response.content_length();

        let mut body = BytesMut::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            exchange.report_download(Progress {
                loaded: body.len() as u64,
                total,
            });
        }

        tracing::trace!(
            request_id = %request.id,
            status = status.as_u16(),
            bytes = body.len(),
            "Exchange completed"
        );

        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            headers,
            body: body.freeze(),
        })
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: std::sync::Arc<TransportRequest>,
        exchange: Exchange,
    ) -> Result<RawResponse, TransportError> {
        exchange.run(self.execute(&request, &exchange)).await
    }
}

/// Apply cache, credentials, referrer and mode policies to `headers`.
fn apply_policies(request: &TransportRequest, headers: &mut Headers) {
    match request.cache {
        Some(CacheMode::NoStore) | Some(CacheMode::Reload) => {
            if !headers.contains("pragma") {
                headers.set("pragma", "no-cache");
            }
            if !headers.contains("cache-control") {
                headers.set("cache-control", "no-cache");
            }
        }
        Some(CacheMode::NoCache) => {
            if !headers.contains("cache-control") {
                headers.set("cache-control", "max-age=0");
            }
        }
        _ => {}
    }

    if request.credentials == Some(CredentialsMode::Omit) {
        headers.remove("cookie");
    }

    match &request.referrer {
        Some(Referrer::Url(url)) => {
            if !headers.contains("referer") {
                headers.set("referer", url.clone());
            }
        }
        Some(Referrer::NoReferrer) => {
            headers.remove("referer");
        }
        Some(Referrer::Client) | None => {}
    }

    if let Some(mode) = request.mode {
        tracing::trace!(request_id = %request.id, mode = ?mode, "Request mode has no effect on this transport");
    }
}

fn default_content_type(body: &RequestBody) -> Option<&'static str> {
    match body {
        RequestBody::Text(_) => Some("text/plain;charset=UTF-8"),
        RequestBody::Json(_) => Some("application/json"),
        RequestBody::Bytes(_) | RequestBody::Multipart(_) => None,
    }
}

fn to_multipart(form: &FormData) -> Result<reqwest::multipart::Form, TransportError> {
    let mut multipart = reqwest::multipart::Form::new();
    for part in &form.parts {
        multipart = match part {
            FormPart::Text { name, value } => multipart.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                mime,
                contents,
            } => {
                let mut file = reqwest::multipart::Part::bytes(contents.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file.mime_str(mime)?;
                }
                multipart.part(name.clone(), file)
            }
        };
    }
    Ok(multipart)
}

/// Body stream reporting bytes as the connection pulls each chunk.
fn upload_stream(
    bytes: Bytes,
    exchange: Exchange,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK).min(bytes.len())))
        .collect();

    let mut loaded = 0u64;
    stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        exchange.report_upload(Progress {
            loaded,
            total: Some(total),
        });
        Ok(chunk)
    })
}
