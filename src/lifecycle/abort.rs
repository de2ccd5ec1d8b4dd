//! Per-dispatch abort scope.
//!
//! # Responsibilities
//! - Let the dispatcher tell the transport to drop an in-flight exchange
//! - Let the transport observe that request synchronously or by awaiting
//!
//! # Design Decisions
//! - One controller per dispatch; never shared across requests
//! - Aborting is idempotent and sticky (watch channel holds `true`)

use std::sync::Arc;

use tokio::sync::watch;

/// Dispatcher side: triggers the abort.
#[derive(Debug, Clone)]
pub struct AbortController {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal handed to the transport.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Abort the exchange. Returns false if it was already aborted.
    pub fn abort(&self) -> bool {
        let changed = self.tx.send_if_modified(|aborted| {
            if *aborted {
                return false;
            }
            *aborted = true;
            true
        });
        if changed {
            tracing::trace!("Abort signalled to transport");
        }
        changed
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport side: observes the abort.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once aborted. Pends forever if the controller goes away
    /// without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
