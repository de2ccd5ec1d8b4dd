//! The three completion sources of a dispatch.
//!
//! Each watcher runs as its own task and races to settle the shared
//! [`SettleGate`]. A watcher that loses still runs to completion; the gate
//! turns its settlement into a no-op.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RequestConfig;
use crate::dispatch::classify;
use crate::dispatch::settle;
use crate::dispatch::state::{DispatchState, SettleGate};
use crate::error::{Rejection, TransportError};
use crate::http::request::TransportRequest;
use crate::lifecycle::{AbortController, Cancel, CancelToken};
use crate::net::{Exchange, Transport};

/// State shared by the watchers of one dispatch.
#[derive(Debug, Clone)]
pub(crate) struct WatchContext {
    pub gate: Arc<SettleGate>,
    pub config: Arc<RequestConfig>,
    pub controller: AbortController,
}

impl WatchContext {
    /// Settle as a network failure.
    pub fn network_failed(&self, cause: TransportError) -> bool {
        let config = self.config.clone();
        self.gate.settle(DispatchState::NetworkError, move |request| {
            Err(classify::network(config, request, cause).into())
        })
    }

    /// Settle with the caller's cancellation reason and abort the exchange.
    pub fn cancelled(&self, reason: Arc<Cancel>) -> bool {
        let won = self
            .gate
            .settle(DispatchState::Cancelled, move |_| Err(Rejection::Cancelled(reason)));
        if won {
            self.controller.abort();
        }
        won
    }
}

/// Network watcher: perform the exchange and settle with its result.
pub(crate) async fn network<T: Transport>(
    transport: Arc<T>,
    request: Arc<TransportRequest>,
    exchange: Exchange,
    ctx: WatchContext,
) {
    let request_id = request.id;
    match transport.send(request, exchange).await {
        Ok(raw) => {
            let config = ctx.config.clone();
            ctx.gate.settle(DispatchState::Succeeded, move |request| {
                settle::settle(settle::decode(raw), config, request)
            });
        }
        Err(TransportError::Aborted) if !ctx.gate.is_in_flight() => {
            tracing::trace!(%request_id, "Exchange aborted after settlement");
        }
        Err(e) => {
            tracing::warn!(%request_id, error = %e, "Exchange failed");
            ctx.network_failed(e);
        }
    }
}

/// Timeout watcher: settle as timed out once `after` elapses.
pub(crate) async fn timeout(ctx: WatchContext, after: Duration) {
    tokio::time::sleep(after).await;

    let config = ctx.config.clone();
    let won = ctx.gate.settle(DispatchState::TimedOut, move |request| {
        Err(classify::timeout(config, request).into())
    });
    if won {
        tracing::debug!(timeout_ms = ctx.config.timeout, "Dispatch timed out");
        ctx.controller.abort();
    }
}

/// Cancellation watcher: settle with the caller's reason once the token fires.
pub(crate) async fn cancellation(ctx: WatchContext, token: CancelToken) {
    let reason = token.cancelled().await;
    if ctx.cancelled(reason) {
        tracing::debug!("Dispatch cancelled");
    }
}
