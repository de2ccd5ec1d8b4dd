//! Caller-owned cancellation.
//!
//! A [`CancelSource`] hands out [`CancelToken`]s that are attached to request
//! configs. Cancelling the source records a single [`Cancel`] reason; every
//! token observes that same reason (pointer-equal `Arc`).

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Reason supplied when a request is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    pub message: Option<String>,
}

impl Cancel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "Cancel: {}", message),
            None => write!(f, "Cancel"),
        }
    }
}

/// Owner side of a cancellation channel.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<Option<Arc<Cancel>>>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// A token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Cancel with a message. Only the first call records a reason.
    pub fn cancel(&self, message: impl Into<String>) -> bool {
        self.cancel_with(Cancel::new(message))
    }

    /// Cancel with a caller-built reason. Returns false if already cancelled.
    pub fn cancel_with(&self, reason: Cancel) -> bool {
        let reason = Arc::new(reason);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
            true
        })
    }

    pub fn reason(&self) -> Option<Arc<Cancel>> {
        self.tx.borrow().clone()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation channel.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<Option<Arc<Cancel>>>,
}

impl CancelToken {
    /// Reason recorded so far, if cancellation was requested.
    pub fn reason(&self) -> Option<Arc<Cancel>> {
        self.rx.borrow().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Resolve once the source is cancelled. Pends forever if the source is
    /// dropped without cancelling.
    pub async fn cancelled(&self) -> Arc<Cancel> {
        let mut rx = self.rx.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
