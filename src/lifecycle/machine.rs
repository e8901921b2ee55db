//! Rule lifecycle state machine.
//!
//! Consumes the current records and one round of probe outcomes and decides,
//! for every candidate rule, whether it is retained, skipped or evicted.
//! Performs no I/O; persisting the result is the store's job.

use std::collections::{BTreeSet, HashMap};

use crate::config::LifecycleConfig;
use crate::lifecycle::record::{LifecycleRecord, Records};
use crate::probe::ProbeOutcome;
use crate::rules::Rule;

/// Which candidates to probe this round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbePlan {
    pub to_probe: Vec<Rule>,
    pub skipped: BTreeSet<Rule>,
}

/// Per-round transition counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionTally {
    /// Probed and resolved.
    pub resolved: usize,
    /// Probed, failed, still below the delete threshold.
    pub failed: usize,
    /// Excluded from probing this round.
    pub skipped: usize,
    /// Left the skip state; probed next round.
    pub recovered: usize,
    /// Neither probed nor skipped (deadline or cancellation).
    pub deferred: usize,
    /// Probed, failed, reached the delete threshold.
    pub evicted: usize,
}

/// Result of advancing the machine by one round.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// Updated records for candidate rules that remain.
    pub next: Records,
    /// Rules written to the shard output.
    pub retained: BTreeSet<Rule>,
    /// Rules removed from the output and from the store.
    pub evicted: BTreeSet<Rule>,
    pub tally: TransitionTally,
}

/// Applies lifecycle transitions under one threshold policy.
#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    policy: LifecycleConfig,
}

impl LifecycleMachine {
    pub fn new(policy: LifecycleConfig) -> Self {
        Self { policy }
    }

    /// Split candidates into rules to probe and rules in the skip state.
    pub fn plan(&self, current: &Records, candidates: &BTreeSet<Rule>) -> ProbePlan {
        let mut plan = ProbePlan::default();
        for rule in candidates {
            match current.get(rule) {
                Some(record) if record.is_skipped(&self.policy) => {
                    plan.skipped.insert(rule.clone());
                }
                _ => plan.to_probe.push(rule.clone()),
            }
        }
        plan
    }

    /// Advance every candidate by one round.
    ///
    /// `candidates` must be the shard's rules together with the rules retained
    /// by the previous round, so that a rule missing from a fresh download is
    /// still evaluated rather than silently dropped.
    pub fn advance(
        &self,
        current: &Records,
        outcomes: &HashMap<Rule, ProbeOutcome>,
        candidates: &BTreeSet<Rule>,
        now: u64,
    ) -> RoundOutcome {
        let mut round = RoundOutcome::default();

        for rule in candidates {
            let prior = current.get(rule);
            let outcome = outcomes.get(rule).copied();

            if outcome == Some(ProbeOutcome::Resolved) {
                round.tally.resolved += 1;
                round.next.insert(rule.clone(), LifecycleRecord::healthy(now));
                round.retained.insert(rule.clone());
                continue;
            }

            if let Some(prior) = prior.filter(|p| p.is_skipped(&self.policy)) {
                let record = self.skip(prior, now);
                if record.force_probe {
                    round.tally.recovered += 1;
                    tracing::debug!(
                        rule = %rule,
                        failures = record.failures,
                        "Skip limit reached, rule will be probed next round"
                    );
                }
                round.tally.skipped += 1;
                round.next.insert(rule.clone(), record);
                round.retained.insert(rule.clone());
                continue;
            }

            if outcome == Some(ProbeOutcome::Unresolved) {
                let failures = match prior {
                    Some(prior) => prior.failures.saturating_add(1),
                    None => self.policy.initial_failure_seed.saturating_add(1),
                };

                if failures >= self.policy.delete_threshold {
                    tracing::debug!(rule = %rule, failures, "Rule evicted");
                    round.tally.evicted += 1;
                    round.evicted.insert(rule.clone());
                } else {
                    tracing::trace!(rule = %rule, failures, "Rule failed to resolve");
                    round.tally.failed += 1;
                    round.next.insert(
                        rule.clone(),
                        LifecycleRecord {
                            failures,
                            skip_rounds: 0,
                            force_probe: false,
                            last_seen: Some(now),
                        },
                    );
                    round.retained.insert(rule.clone());
                }
                continue;
            }

            // Not probed and not skipped: nothing was learned this round.
            round.tally.deferred += 1;
            if let Some(prior) = prior {
                round.next.insert(
                    rule.clone(),
                    LifecycleRecord {
                        last_seen: Some(now),
                        ..*prior
                    },
                );
            }
            round.retained.insert(rule.clone());
        }

        round
    }

    fn skip(&self, prior: &LifecycleRecord, now: u64) -> LifecycleRecord {
        let skip_rounds = prior.skip_rounds.saturating_add(1);
        if skip_rounds >= self.policy.skip_rounds_limit {
            LifecycleRecord {
                failures: self.policy.recovery_baseline,
                skip_rounds: 0,
                force_probe: true,
                last_seen: Some(now),
            }
        } else {
            LifecycleRecord {
                skip_rounds,
                last_seen: Some(now),
                ..*prior
            }
        }
    }
}
