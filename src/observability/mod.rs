//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatch counters and latency histograms)
//!
//! Consumers:
//!     → tracing subscriber installed by the binary (stderr)
//!     → any `metrics` recorder installed by the embedding application
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log event of a dispatch
//! - Without an installed recorder, metric updates are no-ops

pub mod logging;
pub mod metrics;
