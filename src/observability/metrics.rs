//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rule_curator_probes_total` (counter): lookups by outcome
//! - `rule_curator_transitions_total` (counter): lifecycle transitions by shard, kind
//! - `rule_curator_rules_retained` (gauge): rules written to the shard output
//! - `rule_curator_round_duration_seconds` (histogram): wall time of a round
//! - `rule_curator_store_conflicts_total` (counter): keys lost to a concurrent writer
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library code and
//!   tests call these freely
//! - Exposition is a Prometheus textfile written atomically at exit

use std::io;
use std::path::Path;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::lifecycle::TransitionTally;
use crate::persist::write_atomic;
use crate::probe::ProbeOutcome;

pub const PROBES_TOTAL: &str = "rule_curator_probes_total";
pub const TRANSITIONS_TOTAL: &str = "rule_curator_transitions_total";
pub const RULES_RETAINED: &str = "rule_curator_rules_retained";
pub const ROUND_DURATION_SECONDS: &str = "rule_curator_round_duration_seconds";
pub const STORE_CONFLICTS_TOTAL: &str = "rule_curator_store_conflicts_total";

/// Install the Prometheus recorder without an HTTP listener.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Render the current snapshot to `path`.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> io::Result<()> {
    write_atomic(path, handle.render().as_bytes())
}

#[inline]
pub fn record_probe(outcome: ProbeOutcome) {
    counter!(PROBES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Record the end of a shard round.
pub fn record_round(
    shard: u32,
    tally: &TransitionTally,
    retained: usize,
    conflicts: usize,
    elapsed: Duration,
) {
    let shard = shard.to_string();
    let kinds = [
        ("resolved", tally.resolved),
        ("failed", tally.failed),
        ("skipped", tally.skipped),
        ("recovered", tally.recovered),
        ("deferred", tally.deferred),
        ("evicted", tally.evicted),
    ];
    for (kind, count) in kinds {
        counter!(TRANSITIONS_TOTAL, "shard" => shard.clone(), "kind" => kind)
            .increment(count as u64);
    }
    counter!(STORE_CONFLICTS_TOTAL, "shard" => shard.clone()).increment(conflicts as u64);
    gauge!(RULES_RETAINED, "shard" => shard.clone()).set(retained as f64);
    histogram!(ROUND_DURATION_SECONDS, "shard" => shard).record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_probe(ProbeOutcome::Resolved);
        record_round(0, &TransitionTally::default(), 3, 0, Duration::from_millis(5));
    }
}
