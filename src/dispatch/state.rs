//! Dispatch state machine and the exactly-once settle gate.
//!
//! # States
//! ```text
//! Idle → InFlight → Succeeded      (network watcher: exchange completed)
//!                 → TimedOut       (timeout watcher)
//!                 → NetworkError   (network watcher: transport failed)
//!                 → Cancelled      (cancellation watcher)
//! ```
//!
//! # Design Decisions
//! - State lives in an `AtomicU8`; leaving `InFlight` is a single
//!   compare-and-swap, so exactly one watcher wins
//! - Losing watchers still run to completion; they observe the terminal
//!   state and do nothing
//! - The gate owns the dispatcher's `Arc<TransportRequest>` and releases it
//!   to the winner only; nothing can read it after settlement

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::error::Rejection;
use crate::http::request::TransportRequest;
use crate::http::response::StandardizedResponse;

/// Final value of a dispatch.
pub type Outcome = Result<StandardizedResponse, Rejection>;

/// Dispatch lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle = 0,
    InFlight = 1,
    /// The exchange completed; the settler may still reject on an error flag.
    Succeeded = 2,
    TimedOut = 3,
    NetworkError = 4,
    Cancelled = 5,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DispatchState::Idle | DispatchState::InFlight)
    }

    /// Label used in settlement logs.
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchState::Idle => "idle",
            DispatchState::InFlight => "in_flight",
            DispatchState::Succeeded => "succeeded",
            DispatchState::TimedOut => "timed_out",
            DispatchState::NetworkError => "network_error",
            DispatchState::Cancelled => "cancelled",
        }
    }
}

impl From<u8> for DispatchState {
    fn from(val: u8) -> Self {
        match val {
            1 => DispatchState::InFlight,
            2 => DispatchState::Succeeded,
            3 => DispatchState::TimedOut,
            4 => DispatchState::NetworkError,
            5 => DispatchState::Cancelled,
            _ => DispatchState::Idle,
        }
    }
}

/// Shared by all watchers of one dispatch.
#[derive(Debug)]
pub struct SettleGate {
    state: AtomicU8,
    request: Mutex<Option<Arc<TransportRequest>>>,
    outcome_tx: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl SettleGate {
    /// Create an idle gate holding `request`, and the receiver of its outcome.
    pub fn new(request: Arc<TransportRequest>) -> (Arc<Self>, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let gate = Arc::new(Self {
            state: AtomicU8::new(DispatchState::Idle as u8),
            request: Mutex::new(Some(request)),
            outcome_tx: Mutex::new(Some(tx)),
        });
        (gate, rx)
    }

    pub fn state(&self) -> DispatchState {
        DispatchState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_in_flight(&self) -> bool {
        self.state() == DispatchState::InFlight
    }

    /// `Idle → InFlight`. Returns false if the gate was already started.
    pub fn begin(&self) -> bool {
        self.state
            .compare_exchange(
                DispatchState::Idle as u8,
                DispatchState::InFlight as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// True once the request reference has been released.
    pub fn is_released(&self) -> bool {
        lock(&self.request).is_none()
    }

    /// Leave `InFlight` for `terminal` and deliver the outcome built by `f`.
    ///
    /// Only the first caller wins; `f` runs for the winner only and receives
    /// the released request. Later callers get `false` and `f` is dropped.
    pub fn settle<F>(&self, terminal: DispatchState, f: F) -> bool
    where
        F: FnOnce(Arc<TransportRequest>) -> Outcome,
    {
        debug_assert!(terminal.is_terminal());
        let won = self
            .state
            .compare_exchange(
                DispatchState::InFlight as u8,
                terminal as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !won {
            tracing::trace!(
                attempted = terminal.as_str(),
                settled = self.state().as_str(),
                "Late watcher ignored"
            );
            return false;
        }

        let Some(request) = lock(&self.request).take() else {
            return false;
        };
        let outcome = f(request);
        if let Some(tx) = lock(&self.outcome_tx).take() {
            let _ = tx.send(outcome);
        }
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::error::{ErrorKind, StructuredError};
    use crate::http::headers::Headers;
    use crate::http::request::build_request;

    fn gate() -> (Arc<SettleGate>, oneshot::Receiver<Outcome>) {
        let config = RequestConfig::get("http://api.test/");
        let request = build_request(&config, Headers::new()).unwrap();
        SettleGate::new(Arc::new(request))
    }

    fn failure(kind: ErrorKind) -> Outcome {
        Err(StructuredError {
            kind,
            message: format!("{:?}", kind),
            code: None,
            config: Arc::new(RequestConfig::default()),
            request: None,
            response: None,
            cause: None,
        }
        .into())
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            DispatchState::Idle,
            DispatchState::InFlight,
            DispatchState::Succeeded,
            DispatchState::TimedOut,
            DispatchState::NetworkError,
            DispatchState::Cancelled,
        ] {
            assert_eq!(DispatchState::from(state as u8), state);
        }
        assert!(!DispatchState::InFlight.is_terminal());
        assert!(DispatchState::Cancelled.is_terminal());
    }

    #[test]
    fn cannot_settle_before_begin() {
        let (gate, _rx) = gate();
        assert!(!gate.settle(DispatchState::TimedOut, |_| failure(ErrorKind::Timeout)));
        assert_eq!(gate.state(), DispatchState::Idle);
        assert!(gate.begin());
        assert!(!gate.begin());
    }

    #[tokio::test]
    async fn first_settlement_wins_and_releases_request() {
        let (gate, rx) = gate();
        gate.begin();

        assert!(gate.settle(DispatchState::TimedOut, |_| failure(ErrorKind::Timeout)));
        assert!(gate.is_released());

        let mut ran = false;
        assert!(!gate.settle(DispatchState::NetworkError, |_| {
            ran = true;
            failure(ErrorKind::Network)
        }));
        assert!(!ran);
        assert_eq!(gate.state(), DispatchState::TimedOut);

        let outcome = rx.await.unwrap();
        let error = outcome.unwrap_err();
        assert_eq!(error.as_error().unwrap().kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn concurrent_settlers_deliver_once() {
        let (gate, rx) = gate();
        gate.begin();

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let terminal = if i % 2 == 0 {
                    DispatchState::TimedOut
                } else {
                    DispatchState::NetworkError
                };
                gate.settle(terminal, |_| failure(ErrorKind::Network))
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(rx.await.is_ok());
    }
}
