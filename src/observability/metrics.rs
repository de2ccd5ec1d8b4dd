//! Metrics collection.
//!
//! # Metrics
//! - `fetch_dispatch_total` (counter): dispatches by method, outcome
//! - `fetch_dispatch_duration_seconds` (histogram): dispatch latency by outcome
//!
//! # Design Decisions
//! - Emits through the `metrics` facade; exposition belongs to the host
//! - Outcome labels name how the dispatch actually settled

use std::time::Instant;

use crate::error::Rejection;
use crate::http::response::StandardizedResponse;

/// Label for a settled dispatch.
pub fn outcome_label(outcome: &Result<StandardizedResponse, Rejection>) -> &'static str {
    match outcome {
        Ok(_) => "resolved",
        Err(Rejection::Cancelled(_)) => "cancelled",
        Err(Rejection::Failed(error)) => error.kind.as_str(),
    }
}

/// Record one finished dispatch.
pub fn record_dispatch(method: &str, outcome: &'static str, start_time: Instant) {
    let elapsed = start_time.elapsed().as_secs_f64();
    metrics::counter!(
        "fetch_dispatch_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("fetch_dispatch_duration_seconds", "outcome" => outcome).record(elapsed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::RequestConfig;
    use crate::error::{ErrorKind, StructuredError};
    use crate::lifecycle::Cancel;

    fn failed(kind: ErrorKind) -> Result<StandardizedResponse, Rejection> {
        Err(StructuredError {
            kind,
            message: String::new(),
            code: None,
            config: Arc::new(RequestConfig::get("http://api.test/")),
            request: None,
            response: None,
            cause: None,
        }
        .into())
    }

    #[test]
    fn labels_follow_the_rejection_kind() {
        assert_eq!(outcome_label(&failed(ErrorKind::Timeout)), "timeout");
        assert_eq!(outcome_label(&failed(ErrorKind::Network)), "network_error");
        assert_eq!(outcome_label(&failed(ErrorKind::Application)), "application_error");
        assert_eq!(outcome_label(&failed(ErrorKind::Status)), "status_error");
        assert_eq!(outcome_label(&failed(ErrorKind::InvalidUrl)), "invalid_url");
    }

    #[test]
    fn cancellation_has_its_own_label() {
        let outcome = Err(Rejection::Cancelled(Arc::new(Cancel::new("stop"))));
        assert_eq!(outcome_label(&outcome), "cancelled");
    }
}
