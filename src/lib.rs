//! Fetch transport adapter.
//!
//! Turns a declarative [`RequestConfig`] into one outbound HTTP exchange and
//! settles it exactly once: resolved with a [`StandardizedResponse`], or
//! rejected with a [`StructuredError`] or the caller's cancellation reason.
//!
//! ```text
//!  RequestConfig ──▶ http::normalize ──▶ http::request ──▶ dispatch::Adapter
//!                                                             │
//!                          ┌──────────────────────────────────┼───────────────┐
//!                          ▼                                  ▼               ▼
//!                   network watcher                    timeout watcher  cancel watcher
//!                   (net::Transport)                   (tokio timer)    (CancelToken)
//!                          │                                  │               │
//!                          └──────────────▶ SettleGate ◀──────┴───────────────┘
//!                                               │ first wins
//!                                               ▼
//!                                Result<StandardizedResponse, Rejection>
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::{AdapterSettings, RequestConfig, StatusValidator};
pub use dispatch::Adapter;
pub use error::{ErrorCode, ErrorKind, Rejection, StructuredError, TransportError};
pub use http::{Headers, RequestBody, StandardizedResponse};
pub use lifecycle::{Cancel, CancelSource, CancelToken};
pub use net::{ReqwestTransport, Transport};
