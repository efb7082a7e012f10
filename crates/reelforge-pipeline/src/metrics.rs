//! Pipeline metrics collection.
//!
//! Standardized metrics for monitoring production runs:
//! - Attempt counters by verdict
//! - Corrective retry counters
//! - Credit commit counters
//! - Cancellation counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total generation attempts by quality-gate verdict.
    pub const SHOT_ATTEMPTS_TOTAL: &str = "pipeline_shot_attempts_total";

    /// Total corrective retries.
    pub const SHOT_RETRIES_TOTAL: &str = "pipeline_shot_retries_total";

    /// Total credits committed.
    pub const CREDITS_COMMITTED_TOTAL: &str = "pipeline_credits_committed_total";

    /// Total run cancellations.
    pub const CANCELLATIONS_TOTAL: &str = "pipeline_cancellations_total";

    /// Quality-gate score distribution.
    pub const GATE_SCORE: &str = "pipeline_gate_score";
}

/// Record a scored generation attempt.
pub fn record_attempt(passed: bool, score: f32) {
    let verdict = if passed { "passed" } else { "failed" };
    counter!(names::SHOT_ATTEMPTS_TOTAL, "verdict" => verdict).increment(1);
    histogram!(names::GATE_SCORE).record(score as f64);
}

/// Record a corrective retry.
pub fn record_retry() {
    counter!(names::SHOT_RETRIES_TOTAL).increment(1);
}

/// Record a credit commit.
pub fn record_commit(credits: u32) {
    counter!(names::CREDITS_COMMITTED_TOTAL).increment(credits as u64);
}

/// Record a run cancellation.
pub fn record_cancellation() {
    counter!(names::CANCELLATIONS_TOTAL).increment(1);
}
