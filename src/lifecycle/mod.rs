//! Request lifecycle signals.
//!
//! # Data Flow
//! ```text
//! Caller:
//!     CancelSource::cancel(reason) → CancelToken (in RequestConfig)
//!         → cancellation watcher settles the dispatch with the reason
//!
//! Dispatcher:
//!     timeout / cancellation wins → AbortController::abort()
//!         → AbortSignal (held by the transport) → exchange dropped
//! ```
//!
//! # Design Decisions
//! - Cancellation is owned by the caller, abort by the dispatcher
//! - Both are watch channels: late subscribers still see the final value

pub mod abort;
pub mod cancel;

pub use abort::{AbortController, AbortSignal};
pub use cancel::{Cancel, CancelSource, CancelToken};
