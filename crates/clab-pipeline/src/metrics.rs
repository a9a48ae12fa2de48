//! Stage action metrics.

use metrics::counter;

pub mod names {
    pub const STAGE_ACTIONS_TOTAL: &str = "clab_stage_actions_total";
}

/// Record a finished stage action (`ok`, `stale` or an error kind).
pub fn record_stage_action(action: &str, outcome: &str) {
    counter!(
        names::STAGE_ACTIONS_TOTAL,
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
