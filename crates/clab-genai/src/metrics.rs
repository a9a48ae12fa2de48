//! Metrics for generative service calls.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const GENAI_REQUESTS_TOTAL: &str = "clab_genai_requests_total";
    pub const GENAI_RETRIES_TOTAL: &str = "clab_genai_retries_total";
}

/// Record one remote call and how it ended (`ok` or an error kind).
pub fn record_request(operation: &str, outcome: &str) {
    counter!(
        names::GENAI_REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a rate-limit retry.
pub fn record_retry(operation: &str) {
    counter!(names::GENAI_RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}
