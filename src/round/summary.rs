//! Round report.

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

/// Counts from one shard round, printed to stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub run_id: Uuid,
    pub shard: u32,
    /// Shard rules plus previously retained rules.
    pub candidates: usize,
    /// Distinct domains whose lookup completed.
    pub probed: usize,
    /// Rules with no domain to look up.
    pub non_domain: usize,
    pub resolved: usize,
    pub failed: usize,
    pub skipped: usize,
    pub recovered: usize,
    pub deferred: usize,
    /// Retained rules absent from the previous output.
    pub added: usize,
    pub evicted: usize,
    pub retained: usize,
    /// Store keys lost to a concurrent writer.
    pub conflicts: usize,
    pub elapsed: Duration,
}

impl RoundSummary {
    /// Line parsed by the commit-message generator.
    pub fn commit_stats_line(&self) -> String {
        format!(
            "COMMIT_STATS: total {}, added {}, removed {}",
            self.retained, self.added, self.evicted
        )
    }
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "shard {:02}: {} candidates, {} domains probed, {} non-domain",
            self.shard, self.candidates, self.probed, self.non_domain
        )?;
        writeln!(
            f,
            "shard {:02}: {} resolved, {} failed, {} skipped, {} recovered, {} deferred",
            self.shard, self.resolved, self.failed, self.skipped, self.recovered, self.deferred
        )?;
        writeln!(
            f,
            "shard {:02}: retained {}, added {}, evicted {} in {:.1}s",
            self.shard,
            self.retained,
            self.added,
            self.evicted,
            self.elapsed.as_secs_f64()
        )?;
        if self.conflicts > 0 {
            writeln!(f, "shard {:02}: {} store conflicts", self.shard, self.conflicts)?;
        }
        write!(f, "{}", self.commit_stats_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RoundSummary {
        RoundSummary {
            run_id: Uuid::nil(),
            shard: 3,
            candidates: 10,
            probed: 8,
            non_domain: 1,
            resolved: 7,
            failed: 1,
            skipped: 1,
            recovered: 0,
            deferred: 0,
            added: 2,
            evicted: 1,
            retained: 9,
            conflicts: 0,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_commit_stats_line() {
        assert_eq!(
            summary().commit_stats_line(),
            "COMMIT_STATS: total 9, added 2, removed 1"
        );
    }

    #[test]
    fn test_display_ends_with_commit_stats() {
        let text = summary().to_string();
        assert!(text.starts_with("shard 03: 10 candidates"));
        assert_eq!(text.lines().last(), Some("COMMIT_STATS: total 9, added 2, removed 1"));
        assert!(!text.contains("conflicts"));
    }
}
