//! Transport layer.
//!
//! # Data Flow
//! ```text
//! Dispatcher (network watcher)
//!     → Transport::send(Arc<TransportRequest>, Exchange)
//!         → client.rs (reqwest: policies, body, upload progress)
//!         → response head + streamed body (download progress)
//!     ← RawResponse | TransportError
//!
//! Abort:
//!     AbortController (dispatcher) → AbortSignal (Exchange)
//!         → in-flight future dropped → Err(TransportError::Aborted)
//! ```
//!
//! # Design Decisions
//! - The transport is a trait; the adapter never depends on reqwest directly
//! - One `Exchange` per dispatch carries the abort signal and progress hooks
//! - Dropping the in-flight future is how sockets are released on abort

pub mod client;
pub mod progress;

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;
use crate::http::request::TransportRequest;
use crate::http::response::RawResponse;
use crate::lifecycle::{AbortController, AbortSignal};

pub use client::ReqwestTransport;
pub use progress::{Progress, ProgressCallback, ProgressHook};

/// Asynchronous network primitive performing one exchange.
///
/// Implementations must stop work and return [`TransportError::Aborted`]
/// once `exchange.signal()` fires; [`Exchange::run`] does this for any future.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: Arc<TransportRequest>,
        exchange: Exchange,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Per-exchange handle given to the transport.
#[derive(Debug, Clone)]
pub struct Exchange {
    signal: AbortSignal,
    download: Option<ProgressHook>,
    upload: Option<ProgressHook>,
}

impl Exchange {
    pub(crate) fn new(
        signal: AbortSignal,
        download: Option<ProgressHook>,
        upload: Option<ProgressHook>,
    ) -> Self {
        Self {
            signal,
            download,
            upload,
        }
    }

    /// An exchange outside any dispatch: never aborted, no listeners.
    pub fn detached() -> Self {
        Self::new(AbortController::new().signal(), None, None)
    }

    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }

    pub fn wants_upload_progress(&self) -> bool {
        self.upload.is_some()
    }

    pub fn report_download(&self, progress: Progress) {
        if let Some(hook) = &self.download {
            hook.emit(progress);
        }
    }

    pub fn report_upload(&self, progress: Progress) {
        if let Some(hook) = &self.upload {
            hook.emit(progress);
        }
    }

    /// Drive `work` until it completes or the exchange is aborted.
    pub async fn run<T, F>(&self, work: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        if self.is_aborted() {
            return Err(TransportError::Aborted);
        }
        tokio::select! {
            result = work => result,
            _ = self.signal.aborted() => Err(TransportError::Aborted),
        }
    }
}
