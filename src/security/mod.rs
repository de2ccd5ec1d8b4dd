//! Credentials and environment-derived headers.
//!
//! # Data Flow
//! ```text
//! RequestConfig.auth
//!     → auth.rs (Basic base64(username:password))
//! RequestConfig.xsrf_* + Environment
//!     → environment.rs (storage? same origin? cookie value)
//!     → http::normalize sets the anti-forgery header
//! ```
//!
//! # Design Decisions
//! - Environment access is a trait so headless and document contexts differ
//!   only in the implementation handed to the adapter
//! - Credentials are never logged (config `Debug` redacts them)

pub mod auth;
pub mod environment;

pub use auth::BasicAuth;
pub use environment::{DocumentEnvironment, Environment, Headless};
