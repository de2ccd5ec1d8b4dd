//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Resolve the log level from the environment or settings
//!
//! # Design Decisions
//! - `RUST_LOG` takes precedence over the configured level
//! - Library code only emits events; installing a subscriber is the caller's choice

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for `level`, letting `RUST_LOG` override it.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fetch_adapter={level},warn")))
}

/// Install the global subscriber, writing to stderr.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
