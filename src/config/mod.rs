//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! request file (TOML) | CLI flags | builder calls
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RequestConfig (moved into Adapter::dispatch, then shared via Arc)
//!     → AdapterSettings (used once to build the transport)
//! ```
//!
//! # Design Decisions
//! - A request config is immutable once dispatched; only the normalized
//!   header copy is augmented
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Callbacks, tokens and validators are code-only and skipped by serde

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{AdapterSettings, RequestConfig, StatusValidator};
pub use loader::{load_config, read_config, ConfigError, RequestFile};
