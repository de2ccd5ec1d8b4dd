//! Upload/download progress reporting.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::state::SettleGate;

/// Bytes moved so far in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    /// Known only when the peer announced a length.
    pub total: Option<u64>,
}

impl Progress {
    pub fn length_computable(&self) -> bool {
        self.total.is_some()
    }
}

/// Caller-supplied progress listener.
#[derive(Clone)]
pub struct ProgressCallback(Arc<dyn Fn(Progress) + Send + Sync>);

impl ProgressCallback {
    pub fn new(f: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, progress: Progress) {
        (self.0)(progress)
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressCallback")
    }
}

/// A listener attached to one exchange; silent once the dispatch settles.
#[derive(Debug, Clone)]
pub struct ProgressHook {
    callback: ProgressCallback,
    gate: Arc<SettleGate>,
}

impl ProgressHook {
    pub(crate) fn new(callback: ProgressCallback, gate: Arc<SettleGate>) -> Self {
        Self { callback, gate }
    }

    /// Forward `progress` while the dispatch is in flight.
    pub fn emit(&self, progress: Progress) {
        if self.gate.is_in_flight() {
            self.callback.call(progress);
        }
    }
}
