//! Call and race metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `kairos_calls_total` | Counter | `label`, `outcome` | Completed calls |
//! | `kairos_call_duration_seconds` | Histogram | `label` | Call latency |
//! | `kairos_race_winners_total` | Counter | `label` | Races won per branch |
//! | `kairos_race_failures_total` | Counter | - | Races with no winner |
//! | `kairos_persist_failures_total` | Counter | - | Failed persistence attempts |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Completed calls, by label and outcome.
pub const CALLS_TOTAL: &str = "kairos_calls_total";

/// Call latency histogram, by label.
pub const CALL_DURATION_SECONDS: &str = "kairos_call_duration_seconds";

/// Races won, by winning label.
pub const RACE_WINNERS_TOTAL: &str = "kairos_race_winners_total";

/// Races in which every branch failed.
pub const RACE_FAILURES_TOTAL: &str = "kairos_race_failures_total";

/// Persistence attempts that failed or ran out of budget.
pub const PERSIST_FAILURES_TOTAL: &str = "kairos_persist_failures_total";

/// Registers descriptions for all Kairos metrics.
pub fn describe_metrics() {
    describe_counter!(CALLS_TOTAL, "Total number of deadline-bounded calls by outcome");
    describe_histogram!(CALL_DURATION_SECONDS, "Call duration in seconds");
    describe_counter!(RACE_WINNERS_TOTAL, "Races won by each branch label");
    describe_counter!(RACE_FAILURES_TOTAL, "Races in which no branch succeeded");
    describe_counter!(PERSIST_FAILURES_TOTAL, "Persistence attempts that did not complete");
}

/// Records a finished call.
///
/// `outcome` is `"success"` or the error kind (`"timeout"`, `"protocol"`, ...).
pub fn record_call(label: &str, outcome: &str, elapsed: Duration) {
    counter!(
        CALLS_TOTAL,
        "label" => label.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(CALL_DURATION_SECONDS, "label" => label.to_string()).record(elapsed.as_secs_f64());
}

/// Records the winner of a race.
pub fn record_race_winner(label: &str) {
    counter!(RACE_WINNERS_TOTAL, "label" => label.to_string()).increment(1);
}

/// Records a race that produced no winner.
pub fn record_race_failure() {
    counter!(RACE_FAILURES_TOTAL).increment(1);
}

/// Records a persistence attempt that failed.
pub fn record_persist_failure() {
    counter!(PERSIST_FAILURES_TOTAL).increment(1);
}
