//! Dispatch orchestration.
//!
//! # Data Flow
//! ```text
//! RequestConfig
//!     → http::normalize (auth, xsrf, multipart, content-type rules)
//!     → http::request::build_request_in (URL against the environment base,
//!       params, method, body)
//!     → SettleGate::begin (Idle → InFlight)
//!     → spawn watchers:
//!         network  → Transport::send → settle.rs (decode, flag, validator)
//!         timeout  → classify::timeout + abort        (timeout > 0)
//!         cancel   → caller reason + abort            (token present)
//!     → first settlement wins; outcome delivered once via oneshot
//!     → losing timer/cancel tasks aborted, metrics + log recorded
//! ```
//!
//! Dropping the dispatch future before it settles aborts the exchange and
//! every watcher task it spawned.
//!
//! # Design Decisions
//! - Every dispatch owns its gate, abort controller and timer
//! - Nothing errors synchronously; an invalid URL is an ordinary rejection
//! - A token cancelled before dispatch settles without touching the network

pub mod classify;
pub mod settle;
pub mod state;
pub(crate) mod watchers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::AbortHandle;

use crate::config::RequestConfig;
use crate::error::{ErrorKind, Rejection, StructuredError, TransportError};
use crate::http::normalize::normalize_headers;
use crate::http::request::build_request_in;
use crate::http::response::StandardizedResponse;
use crate::lifecycle::AbortController;
use crate::net::{Exchange, ProgressCallback, ProgressHook, Transport};
use crate::observability::metrics;
use crate::security::environment::{Environment, Headless};

use self::state::SettleGate;
use self::watchers::WatchContext;

/// Tears down a dispatch whose future is dropped before it settles.
struct DispatchGuard {
    controller: AbortController,
    network: Option<AbortHandle>,
    watchers: Vec<AbortHandle>,
    settled: bool,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Dispatch dropped before settlement; aborting exchange");
            self.controller.abort();
            if let Some(network) = &self.network {
                network.abort();
            }
        }
        // Losers may still be pending; release their timers and wakers.
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

/// Turns request configurations into settled exchanges over `T`.
#[derive(Clone)]
pub struct Adapter<T: Transport> {
    transport: Arc<T>,
    environment: Arc<dyn Environment>,
}

impl<T: Transport> Adapter<T> {
    /// Adapter without standard storage: no anti-forgery token is ever read.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            environment: Arc::new(Headless),
        }
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform one exchange described by `config`.
    ///
    /// Resolves with the standardized response, or rejects with a
    /// [`StructuredError`] or the caller's cancellation reason.
    pub async fn dispatch(&self, config: RequestConfig) -> Result<StandardizedResponse, Rejection> {
        let start_time = Instant::now();
        let config = Arc::new(config);
        let method = config.method.to_uppercase();

        let headers = normalize_headers(&config, self.environment.as_ref());
        let request = match build_request_in(&config, headers, self.environment.base_url()) {
            Ok(request) => Arc::new(request),
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "Rejecting request");
                let outcome = Err(classify::invalid_url(config, e).into());
                metrics::record_dispatch(&method, metrics::outcome_label(&outcome), start_time);
                return outcome;
            }
        };
        let request_id = request.id;

        let (gate, mut outcome_rx) = SettleGate::new(request.clone());
        let controller = AbortController::new();
        let hook = |callback: &Option<ProgressCallback>| {
            callback
                .clone()
                .map(|callback| ProgressHook::new(callback, gate.clone()))
        };
        let exchange = Exchange::new(
            controller.signal(),
            hook(&config.on_download_progress),
            hook(&config.on_upload_progress),
        );
        let ctx = WatchContext {
            gate: gate.clone(),
            config: config.clone(),
            controller: controller.clone(),
        };

        gate.begin();
        tracing::debug!(
            %request_id,
            method = %request.method,
            url = %request.url,
            timeout_ms = config.timeout,
            "Dispatch started"
        );

        let already_cancelled = config.cancel_token.as_ref().and_then(|token| token.reason());
        let network = match already_cancelled {
            Some(reason) => {
                ctx.cancelled(reason);
                drop(request);
                None
            }
            None => Some(tokio::spawn(watchers::network(
                self.transport.clone(),
                request,
                exchange,
                ctx.clone(),
            ))),
        };

        let timer = (config.timeout > 0 && network.is_some()).then(|| {
            tokio::spawn(watchers::timeout(
                ctx.clone(),
                Duration::from_millis(config.timeout),
            ))
        });
        let canceller = match (&config.cancel_token, &network) {
            (Some(token), Some(_)) => Some(tokio::spawn(watchers::cancellation(
                ctx.clone(),
                token.clone(),
            ))),
            _ => None,
        };

        let mut guard = DispatchGuard {
            controller,
            network: network.as_ref().map(|handle| handle.abort_handle()),
            watchers: timer
                .iter()
                .chain(canceller.iter())
                .map(|handle| handle.abort_handle())
                .collect(),
            settled: false,
        };

        let received = match network {
            Some(mut handle) => {
                tokio::select! {
                    received = &mut outcome_rx => received,
                    joined = &mut handle => {
                        if let Err(e) = joined {
                            tracing::error!(%request_id, error = %e, "Network watcher failed");
                            ctx.network_failed(TransportError::Other(e.to_string()));
                        }
                        outcome_rx.await
                    }
                }
            }
            None => outcome_rx.await,
        };

        guard.settled = true;
        drop(guard);

        let outcome = received.unwrap_or_else(|_| {
            Err(StructuredError {
                kind: ErrorKind::Network,
                message: "Network Error".to_string(),
                code: None,
                config: config.clone(),
                request: None,
                response: None,
                cause: Some(TransportError::Other("dispatch settled without an outcome".into())),
            }
            .into())
        });

        let label = metrics::outcome_label(&outcome);
        metrics::record_dispatch(&method, label, start_time);
        match &outcome {
            Ok(response) => tracing::debug!(
                %request_id,
                status = response.status,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Dispatch resolved"
            ),
            Err(rejection) => tracing::debug!(
                %request_id,
                outcome = label,
                error = %rejection,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Dispatch rejected"
            ),
        }
        outcome
    }
}
